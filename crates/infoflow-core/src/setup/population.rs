//! Population Spawning
//!
//! Spawns citizens with randomized cognitive traits and the configured media
//! agents. Every draw comes from the simulation context, in a fixed order.

use bevy_ecs::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;
use std::fmt;

use infoflow_events::SourceType;

use crate::components::citizen::{Citizen, CognitiveTraits, TrustLevels};
use crate::components::content::MediaId;
use crate::components::media::{pick_followers, MediaAgent};
use crate::config::ScenarioConfig;
use crate::error::ConfigError;
use crate::SimContext;

/// Draws one citizen's traits from the scenario distributions.
fn generate_traits(
    config: &ScenarioConfig,
    truth_seeking: &Normal<f64>,
    ctx: &mut SimContext,
) -> CognitiveTraits {
    let rng = &mut ctx.rng;
    CognitiveTraits {
        truth_seeking: truth_seeking.sample(rng).clamp(-5.0, 5.0),
        confirmation_bias: rng.gen_range(config.confirmation_bias_min..=config.confirmation_bias_max),
        critical_thinking: rng.gen_range(config.critical_thinking_min..=config.critical_thinking_max),
        social_conformity: rng.gen_range(config.social_conformity_min..=config.social_conformity_max),
        influence: rng.gen_range(config.influence_min..=config.influence_max),
    }
}

/// Spawn `num_citizens` citizens with ids `0..n`.
pub fn spawn_citizens(
    world: &mut World,
    config: &ScenarioConfig,
    ctx: &mut SimContext,
) -> Result<Vec<Entity>, ConfigError> {
    let truth_seeking = Normal::new(config.truth_seeking_mean, config.truth_seeking_std)
        .map_err(|e| ConfigError::invalid("truth_seeking_std", e.to_string()))?;

    let trust = SourceType::ALL
        .iter()
        .fold(TrustLevels::new(), |levels, &source| {
            levels.with(source, config.initial_trust(source))
        });

    let mut spawned = Vec::with_capacity(config.num_citizens);
    for id in 0..config.num_citizens {
        let belief = match config.initial_belief {
            Some(belief) => belief,
            None => ctx.rng.gen::<f64>(),
        };
        let traits = generate_traits(config, &truth_seeking, ctx);
        let citizen = Citizen::new(id, belief, config.initial_confidence, traits)
            .with_trust(trust.clone());
        spawned.push(world.spawn(citizen).id());
    }

    Ok(spawned)
}

/// Spawn every media agent. Ids run corporate, then influencers, then government.
pub fn spawn_media(world: &mut World, config: &ScenarioConfig, ctx: &mut SimContext) -> Vec<Entity> {
    let mut spawned = Vec::with_capacity(config.num_media());
    let mut next_id = 0;
    let mut next = || {
        let id = MediaId(next_id);
        next_id += 1;
        id
    };

    for _ in 0..config.num_corporate_media {
        let bias = ctx
            .rng
            .gen_range(config.corporate_bias_min..=config.corporate_bias_max);
        let media = MediaAgent::corporate(next())
            .with_bias(bias)
            .with_credibility(config.corporate_credibility)
            .with_authority(config.corporate_authority)
            .with_truth_commitment(config.corporate_truth_commitment)
            .with_publication_rate(config.corporate_publication_rate)
            .with_influence_reach(config.corporate_influence_reach);
        spawned.push(world.spawn(media).id());
    }

    for _ in 0..config.num_influencers {
        let bias = ctx
            .rng
            .gen_range(config.influencer_bias_min..=config.influencer_bias_max);
        let followers = pick_followers(
            config.num_citizens,
            config.follower_fraction_min,
            config.follower_fraction_max,
            ctx,
        );
        let media = MediaAgent::influencer(next(), config.influencer_engagement_factor)
            .with_bias(bias)
            .with_credibility(config.influencer_credibility)
            .with_authority(config.influencer_authority)
            .with_truth_commitment(config.influencer_truth_commitment)
            .with_publication_rate(config.influencer_publication_rate)
            .with_influence_reach(config.influencer_influence_reach)
            .with_followers(followers);
        spawned.push(world.spawn(media).id());
    }

    for _ in 0..config.num_government_media {
        let media = MediaAgent::government(next())
            .with_bias(config.government_bias)
            .with_credibility(config.government_credibility)
            .with_authority(config.government_authority)
            .with_truth_commitment(config.government_truth_commitment)
            .with_publication_rate(config.government_publication_rate)
            .with_influence_reach(config.government_influence_reach);
        spawned.push(world.spawn(media).id());
    }

    spawned
}

/// Get summary stats for the spawned population
pub fn get_spawn_summary(world: &mut World) -> SpawnSummary {
    let citizens = world.query::<&Citizen>().iter(world).count();

    let mut media_by_type: BTreeMap<SourceType, usize> = BTreeMap::new();
    let mut total_followers = 0;
    let mut query = world.query::<&MediaAgent>();
    for media in query.iter(world) {
        *media_by_type.entry(media.source_type()).or_insert(0) += 1;
        total_followers += media.followers().map_or(0, |f| f.len());
    }

    SpawnSummary {
        citizens,
        media_by_type,
        total_followers,
    }
}

/// Summary of the spawned population
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnSummary {
    pub citizens: usize,
    pub media_by_type: BTreeMap<SourceType, usize>,
    /// Sum of follower set sizes over all influencers
    pub total_followers: usize,
}

impl fmt::Display for SpawnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Citizens: {}", self.citizens)?;
        writeln!(f, "Media:")?;
        for (source, count) in &self.media_by_type {
            writeln!(f, "  {}: {}", source, count)?;
        }
        write!(f, "Influencer followers: {}", self.total_followers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citizen_traits_within_configured_ranges() {
        let config = ScenarioConfig::default();
        let mut ctx = SimContext::seeded(12345);
        let mut world = World::new();

        let spawned = spawn_citizens(&mut world, &config, &mut ctx).unwrap();
        assert_eq!(spawned.len(), 100);

        let mut query = world.query::<&Citizen>();
        for citizen in query.iter(&world) {
            let t = &citizen.traits;
            assert!((0.0..=1.0).contains(&citizen.belief));
            assert!((-5.0..=5.0).contains(&t.truth_seeking));
            assert!((4.0..=7.0).contains(&t.confirmation_bias));
            assert!((4.0..=7.0).contains(&t.critical_thinking));
            assert!((4.0..=7.0).contains(&t.social_conformity));
            assert!((1.0..=10.0).contains(&t.influence));
            assert_eq!(citizen.confidence, 5.0);
            assert_eq!(citizen.trust.get(SourceType::Government), 5.0);
        }
    }

    #[test]
    fn test_fixed_initial_belief() {
        let config = ScenarioConfig {
            num_citizens: 10,
            initial_belief: Some(0.5),
            ..ScenarioConfig::default()
        };
        let mut ctx = SimContext::seeded(1);
        let mut world = World::new();
        spawn_citizens(&mut world, &config, &mut ctx).unwrap();

        let mut query = world.query::<&Citizen>();
        assert!(query.iter(&world).all(|c| c.belief == 0.5));
    }

    #[test]
    fn test_media_spawn_summary() {
        let config = ScenarioConfig::default();
        let mut ctx = SimContext::seeded(9);
        let mut world = World::new();
        spawn_citizens(&mut world, &config, &mut ctx).unwrap();
        let media = spawn_media(&mut world, &config, &mut ctx);
        assert_eq!(media.len(), 9);

        let summary = get_spawn_summary(&mut world);
        assert_eq!(summary.citizens, 100);
        assert_eq!(summary.media_by_type.get(&SourceType::Corporate), Some(&3));
        assert_eq!(summary.media_by_type.get(&SourceType::Influencer), Some(&5));
        assert_eq!(summary.media_by_type.get(&SourceType::Government), Some(&1));
        assert!(summary.total_followers >= 5 * 5);
        assert!(summary.to_string().contains("Citizens: 100"));
    }

    #[test]
    fn test_media_ids_are_sequential() {
        let config = ScenarioConfig::default();
        let mut ctx = SimContext::seeded(2);
        let mut world = World::new();
        spawn_media(&mut world, &config, &mut ctx);

        let mut ids: Vec<usize> = world
            .query::<&MediaAgent>()
            .iter(&world)
            .map(|m| m.id.0)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..9).collect::<Vec<_>>());
    }
}
