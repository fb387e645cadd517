//! Social Influence System
//!
//! Citizens drift toward the influence-weighted belief of their neighbors.
//! Neighbor beliefs are read from a snapshot taken when the step begins, so
//! the result does not depend on update order.

use bevy_ecs::prelude::*;

use crate::components::citizen::{influence_weighted_average, Citizen};
use crate::network::SocialGraph;
use crate::SimContext;

use super::step::{SimulationClock, StepFaults};

/// Resource: `(belief, influence)` of every citizen at the start of the step.
#[derive(Resource, Debug, Default, Clone)]
pub struct BeliefSnapshot(Vec<(f64, f64)>);

impl BeliefSnapshot {
    pub fn belief(&self, id: usize) -> Option<f64> {
        self.0.get(id).map(|(belief, _)| *belief)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Freezes every citizen's belief before anything else moves it.
pub fn capture_belief_snapshot(
    citizens: Query<&Citizen>,
    clock: Res<SimulationClock>,
    mut snapshot: ResMut<BeliefSnapshot>,
    mut faults: ResMut<StepFaults>,
) {
    let count = citizens.iter().count();
    snapshot.0.clear();
    snapshot.0.resize(count, (0.0, 0.0));

    for citizen in citizens.iter() {
        match snapshot.0.get_mut(citizen.id) {
            Some(slot) => *slot = (citizen.belief, citizen.traits.influence),
            None => faults.push(format!(
                "step {}: citizen id {} outside population of {}",
                clock.current_step, citizen.id, count
            )),
        }
    }
}

/// Pulls each citizen toward its neighborhood's start-of-step belief.
pub fn apply_social_influence(
    graph: Res<SocialGraph>,
    snapshot: Res<BeliefSnapshot>,
    ctx: Res<SimContext>,
    mut citizens: Query<&mut Citizen>,
) {
    for mut citizen in citizens.iter_mut() {
        let neighborhood = graph
            .neighbors(citizen.id)
            .filter_map(|n| snapshot.0.get(n).copied());
        if let Some(average) = influence_weighted_average(neighborhood) {
            citizen.be_influenced_by(average, &ctx.tuning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::citizen::CognitiveTraits;
    use crate::network::{build, NetworkParams, NetworkType};

    fn traits(conformity: f64, influence: f64) -> CognitiveTraits {
        CognitiveTraits {
            social_conformity: conformity,
            influence,
            ..CognitiveTraits::default()
        }
    }

    #[test]
    fn test_influence_reads_start_of_step_beliefs() {
        // Ring of three: every citizen neighbors the other two
        let params = NetworkParams {
            small_world_k: 2,
            small_world_p: 0.0,
            ..NetworkParams::default()
        };
        let graph = build(NetworkType::SmallWorld, 3, &params, 1).unwrap();

        let mut world = World::new();
        world.spawn(Citizen::new(0, 0.0, 5.0, traits(10.0, 1.0)));
        world.spawn(Citizen::new(1, 1.0, 5.0, traits(10.0, 1.0)));
        world.spawn(Citizen::new(2, 1.0, 5.0, traits(10.0, 1.0)));
        world.insert_resource(graph);
        world.insert_resource(BeliefSnapshot::default());
        world.insert_resource(SimulationClock::default());
        world.insert_resource(StepFaults::default());
        world.insert_resource(SimContext::seeded(1));

        let mut schedule = Schedule::default();
        schedule.add_systems((capture_belief_snapshot, apply_social_influence).chain());
        schedule.run(&mut world);

        let mut beliefs: Vec<(usize, f64)> = world
            .query::<&Citizen>()
            .iter(&world)
            .map(|c| (c.id, c.belief))
            .collect();
        beliefs.sort_by_key(|(id, _)| *id);

        // Pull is 10/10 * 0.1 toward the neighbor mean
        assert!((beliefs[0].1 - 0.1).abs() < 1e-12);
        assert!((beliefs[1].1 - 0.95).abs() < 1e-12);
        assert!((beliefs[2].1 - 0.95).abs() < 1e-12);
        assert_eq!(world.resource::<BeliefSnapshot>().belief(0), Some(0.0));
    }

    #[test]
    fn test_uninfluential_neighbors_exert_no_pull() {
        let params = NetworkParams {
            small_world_k: 2,
            small_world_p: 0.0,
            ..NetworkParams::default()
        };
        let graph = build(NetworkType::SmallWorld, 3, &params, 1).unwrap();

        let mut world = World::new();
        world.spawn(Citizen::new(0, 0.2, 5.0, traits(10.0, 0.0)));
        world.spawn(Citizen::new(1, 0.9, 5.0, traits(10.0, 0.0)));
        world.spawn(Citizen::new(2, 0.6, 5.0, traits(10.0, 0.0)));
        world.insert_resource(graph);
        world.insert_resource(BeliefSnapshot::default());
        world.insert_resource(SimulationClock::default());
        world.insert_resource(StepFaults::default());
        world.insert_resource(SimContext::seeded(1));

        let mut schedule = Schedule::default();
        schedule.add_systems((capture_belief_snapshot, apply_social_influence).chain());
        schedule.run(&mut world);

        let mut beliefs: Vec<(usize, f64)> = world
            .query::<&Citizen>()
            .iter(&world)
            .map(|c| (c.id, c.belief))
            .collect();
        beliefs.sort_by_key(|(id, _)| *id);
        assert_eq!(beliefs, vec![(0, 0.2), (1, 0.9), (2, 0.6)]);
    }

    #[test]
    fn test_isolated_citizen_is_unmoved() {
        let mut world = World::new();
        world.spawn(Citizen::new(0, 0.3, 5.0, traits(10.0, 5.0)));
        world.insert_resource(SocialGraph::new(1));
        world.insert_resource(BeliefSnapshot::default());
        world.insert_resource(SimulationClock::default());
        world.insert_resource(StepFaults::default());
        world.insert_resource(SimContext::seeded(1));

        let mut schedule = Schedule::default();
        schedule.add_systems((capture_belief_snapshot, apply_social_influence).chain());
        schedule.run(&mut world);

        let belief = world.query::<&Citizen>().single(&world).belief;
        assert_eq!(belief, 0.3);
    }
}
