//! Network Builder
//!
//! Constructs the static, undirected graph connecting citizens. Media agents
//! are not nodes; their reach is computed separately.
//!
//! All three generators are reproducible: the same `(type, params, seed)`
//! always yields the same edge set.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::NetworkError;

/// Topology family for the citizen graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    /// Watts-Strogatz ring lattice with random rewiring
    #[default]
    SmallWorld,
    /// Barabasi-Albert preferential attachment
    ScaleFree,
    /// Erdos-Renyi independent edges
    Random,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::SmallWorld => "small_world",
            NetworkType::ScaleFree => "scale_free",
            NetworkType::Random => "random",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small_world" => Ok(NetworkType::SmallWorld),
            "scale_free" => Ok(NetworkType::ScaleFree),
            "random" => Ok(NetworkType::Random),
            other => Err(format!("unknown network type: {}", other)),
        }
    }
}

/// Density and rewiring controls for every network family.
///
/// Only the fields of the selected family are consulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Ring neighbors per node (small world); must be even
    pub small_world_k: usize,
    /// Rewiring probability per edge (small world)
    pub small_world_p: f64,
    /// Edges attached per new node (scale free)
    pub scale_free_m: usize,
    /// Independent edge probability (random)
    pub random_p: f64,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            small_world_k: 4,
            small_world_p: 0.1,
            scale_free_m: 3,
            random_p: 0.1,
        }
    }
}

/// Resource: The undirected citizen graph, read-only once built.
///
/// Node `i` is the citizen with id `i`. Isolated nodes are legal.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Default)]
pub struct SocialGraph {
    adjacency: Vec<BTreeSet<usize>>,
}

impl SocialGraph {
    /// Graph with `node_count` nodes and no edges.
    pub fn new(node_count: usize) -> Self {
        Self {
            adjacency: vec![BTreeSet::new(); node_count],
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|n| n.len()).sum::<usize>() / 2
    }

    /// Neighbors of a node in ascending order; empty for unknown nodes.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency
            .get(node)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency.get(node).map_or(0, |set| set.len())
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency.get(a).is_some_and(|set| set.contains(&b))
    }

    /// Every edge once, as `(low, high)` pairs in ascending order.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for (a, set) in self.adjacency.iter().enumerate() {
            for &b in set.range(a + 1..) {
                edges.push((a, b));
            }
        }
        edges
    }

    /// Nodes with no neighbors.
    pub fn isolated_nodes(&self) -> Vec<usize> {
        self.adjacency
            .iter()
            .enumerate()
            .filter(|(_, set)| set.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    fn add_edge(&mut self, a: usize, b: usize) {
        if a == b || a >= self.adjacency.len() || b >= self.adjacency.len() {
            return;
        }
        self.adjacency[a].insert(b);
        self.adjacency[b].insert(a);
    }

    fn remove_edge(&mut self, a: usize, b: usize) {
        if let Some(set) = self.adjacency.get_mut(a) {
            set.remove(&b);
        }
        if let Some(set) = self.adjacency.get_mut(b) {
            set.remove(&a);
        }
    }
}

/// Build a citizen graph of the requested family.
pub fn build(
    network_type: NetworkType,
    num_citizens: usize,
    params: &NetworkParams,
    seed: u64,
) -> Result<SocialGraph, NetworkError> {
    let mut rng = SmallRng::seed_from_u64(seed);

    let graph = match network_type {
        NetworkType::SmallWorld => small_world(
            num_citizens,
            params.small_world_k,
            params.small_world_p,
            &mut rng,
        )?,
        NetworkType::ScaleFree => scale_free(num_citizens, params.scale_free_m, &mut rng)?,
        NetworkType::Random => random(num_citizens, params.random_p, &mut rng)?,
    };

    tracing::debug!(
        network = %network_type,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        isolated = graph.isolated_nodes().len(),
        "Built citizen network"
    );

    Ok(graph)
}

fn check_probability(network: &'static str, name: &'static str, p: f64) -> Result<(), NetworkError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(NetworkError::InvalidParameter {
            network,
            name,
            reason: format!("probability {} is outside [0, 1]", p),
        });
    }
    Ok(())
}

/// Watts-Strogatz: ring lattice with `k / 2` neighbors on each side, each
/// lattice edge rewired to a uniformly random endpoint with probability `p`.
pub fn small_world(
    n: usize,
    k: usize,
    p: f64,
    rng: &mut SmallRng,
) -> Result<SocialGraph, NetworkError> {
    check_probability("small_world", "p", p)?;
    if n == 0 {
        return Ok(SocialGraph::new(0));
    }
    if k >= n {
        return Err(NetworkError::InvalidParameter {
            network: "small_world",
            name: "k",
            reason: format!("k ({}) must be smaller than the population ({})", k, n),
        });
    }
    if k % 2 == 1 {
        return Err(NetworkError::InvalidParameter {
            network: "small_world",
            name: "k",
            reason: format!("k ({}) must be even", k),
        });
    }

    let mut graph = SocialGraph::new(n);
    let half = k / 2;

    for j in 1..=half {
        for u in 0..n {
            graph.add_edge(u, (u + j) % n);
        }
    }

    for j in 1..=half {
        for u in 0..n {
            if rng.gen::<f64>() >= p {
                continue;
            }
            let v = (u + j) % n;
            let mut w = rng.gen_range(0..n);
            let mut rewired = true;
            while w == u || graph.has_edge(u, w) {
                // Saturated node: nothing left to rewire to
                if graph.degree(u) >= n - 1 {
                    rewired = false;
                    break;
                }
                w = rng.gen_range(0..n);
            }
            if rewired {
                graph.remove_edge(u, v);
                graph.add_edge(u, w);
            }
        }
    }

    Ok(graph)
}

/// Barabasi-Albert: each new node attaches `m` edges to distinct existing
/// nodes chosen proportionally to degree.
pub fn scale_free(n: usize, m: usize, rng: &mut SmallRng) -> Result<SocialGraph, NetworkError> {
    if n == 0 {
        return Ok(SocialGraph::new(0));
    }
    if m < 1 || m >= n {
        return Err(NetworkError::InvalidParameter {
            network: "scale_free",
            name: "m",
            reason: format!("m ({}) must be in [1, {})", m, n),
        });
    }

    let mut graph = SocialGraph::new(n);
    let mut repeated: Vec<usize> = Vec::with_capacity(2 * n * m);
    let mut targets: Vec<usize> = (0..m).collect();

    for source in m..n {
        for &target in &targets {
            graph.add_edge(source, target);
        }
        repeated.extend(targets.iter().copied());
        repeated.extend(std::iter::repeat(source).take(m));

        let mut chosen = BTreeSet::new();
        while chosen.len() < m {
            chosen.insert(repeated[rng.gen_range(0..repeated.len())]);
        }
        targets = chosen.into_iter().collect();
    }

    Ok(graph)
}

/// Erdos-Renyi: every pair is connected independently with probability `p`.
pub fn random(n: usize, p: f64, rng: &mut SmallRng) -> Result<SocialGraph, NetworkError> {
    check_probability("random", "p", p)?;

    let mut graph = SocialGraph::new(n);
    for a in 0..n {
        for b in (a + 1)..n {
            if rng.gen::<f64>() < p {
                graph.add_edge(a, b);
            }
        }
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(k: usize, p: f64) -> NetworkParams {
        NetworkParams {
            small_world_k: k,
            small_world_p: p,
            ..NetworkParams::default()
        }
    }

    #[test]
    fn test_small_world_is_reproducible() {
        let a = build(NetworkType::SmallWorld, 100, &params(4, 0.1), 7).unwrap();
        let b = build(NetworkType::SmallWorld, 100, &params(4, 0.1), 7).unwrap();
        assert_eq!(a.edges(), b.edges());
        assert_eq!(a.node_count(), 100);
    }

    #[test]
    fn test_small_world_without_rewiring_is_ring_lattice() {
        let graph = build(NetworkType::SmallWorld, 10, &params(4, 0.0), 1).unwrap();
        assert_eq!(graph.edge_count(), 20);
        for node in 0..10 {
            assert_eq!(graph.degree(node), 4);
        }
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(0, 2));
        assert!(graph.has_edge(0, 9));
        assert!(graph.has_edge(0, 8));
        assert!(!graph.has_edge(0, 5));
    }

    #[test]
    fn test_small_world_rewiring_preserves_edge_count() {
        let graph = build(NetworkType::SmallWorld, 60, &params(6, 0.5), 3).unwrap();
        assert_eq!(graph.edge_count(), 60 * 3);
    }

    #[test]
    fn test_small_world_rejects_k_at_population() {
        let err = build(NetworkType::SmallWorld, 4, &params(4, 0.1), 1).unwrap_err();
        assert!(err.to_string().contains("smaller than the population"));
    }

    #[test]
    fn test_small_world_rejects_odd_k() {
        assert!(build(NetworkType::SmallWorld, 20, &params(3, 0.1), 1).is_err());
    }

    #[test]
    fn test_invalid_probability_rejected() {
        assert!(build(NetworkType::SmallWorld, 20, &params(4, 1.5), 1).is_err());
        let random_params = NetworkParams {
            random_p: -0.1,
            ..NetworkParams::default()
        };
        assert!(build(NetworkType::Random, 20, &random_params, 1).is_err());
    }

    #[test]
    fn test_scale_free_edge_count() {
        let params = NetworkParams {
            scale_free_m: 2,
            ..NetworkParams::default()
        };
        let graph = build(NetworkType::ScaleFree, 50, &params, 11).unwrap();
        // Each of the n - m new nodes attaches exactly m edges
        assert_eq!(graph.edge_count(), (50 - 2) * 2);
        assert_eq!(graph, build(NetworkType::ScaleFree, 50, &params, 11).unwrap());
    }

    #[test]
    fn test_scale_free_rejects_bad_m() {
        let zero = NetworkParams {
            scale_free_m: 0,
            ..NetworkParams::default()
        };
        assert!(build(NetworkType::ScaleFree, 10, &zero, 1).is_err());
        let big = NetworkParams {
            scale_free_m: 10,
            ..NetworkParams::default()
        };
        assert!(build(NetworkType::ScaleFree, 10, &big, 1).is_err());
    }

    #[test]
    fn test_random_extremes() {
        let empty = NetworkParams {
            random_p: 0.0,
            ..NetworkParams::default()
        };
        let graph = build(NetworkType::Random, 12, &empty, 5).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.isolated_nodes().len(), 12);

        let full = NetworkParams {
            random_p: 1.0,
            ..NetworkParams::default()
        };
        let graph = build(NetworkType::Random, 12, &full, 5).unwrap();
        assert_eq!(graph.edge_count(), 12 * 11 / 2);
    }

    #[test]
    fn test_empty_population_yields_empty_graph() {
        for network_type in [NetworkType::SmallWorld, NetworkType::ScaleFree, NetworkType::Random] {
            let graph = build(network_type, 0, &NetworkParams::default(), 1).unwrap();
            assert_eq!(graph.node_count(), 0);
            assert!(graph.edges().is_empty());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = build(NetworkType::Random, 40, &NetworkParams::default(), 1).unwrap();
        let b = build(NetworkType::Random, 40, &NetworkParams::default(), 2).unwrap();
        assert_ne!(a.edges(), b.edges());
    }

    #[test]
    fn test_network_type_parsing() {
        assert_eq!("scale_free".parse::<NetworkType>(), Ok(NetworkType::ScaleFree));
        assert!("lattice".parse::<NetworkType>().is_err());
        assert_eq!(NetworkType::default().to_string(), "small_world");
    }
}
