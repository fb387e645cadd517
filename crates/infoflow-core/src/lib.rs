//! Information Flow Simulation Engine
//!
//! Agent-based simulation of how content, belief, and trust in its sources
//! propagate through a social network of citizens fed by media agents.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

pub mod components;
pub mod config;
pub mod error;
pub mod model;
pub mod network;
pub mod output;
pub mod setup;
pub mod systems;

pub use components::*;
pub use config::{BehaviorTuning, ScenarioConfig};
pub use error::{ConfigError, NetworkError, SimError};
pub use model::InfoFlowModel;
pub use network::{NetworkParams, NetworkType, SocialGraph};

/// Resource: The single source of randomness plus the behavioral coefficients.
///
/// Every stochastic decision in a run draws from `rng`, so a run is fully
/// determined by its scenario and seed.
#[derive(Resource, Debug, Clone)]
pub struct SimContext {
    pub rng: SmallRng,
    pub tuning: BehaviorTuning,
}

impl SimContext {
    pub fn new(seed: u64, tuning: BehaviorTuning) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            tuning,
        }
    }

    /// Context with default tuning, mostly for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::new(seed, BehaviorTuning::default())
    }
}
