//! Citizen Snapshots
//!
//! Optional per-agent records for tracking individuals across steps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::source::SourceType;

/// State of one citizen at the end of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitizenSnapshot {
    pub step: u64,
    pub agent_id: usize,
    pub belief: f64,
    pub confidence: f64,
    pub trust_levels: BTreeMap<SourceType, f64>,
}

impl CitizenSnapshot {
    /// Creates a snapshot with no trust entries.
    pub fn new(step: u64, agent_id: usize, belief: f64, confidence: f64) -> Self {
        Self {
            step,
            agent_id,
            belief,
            confidence,
            trust_levels: BTreeMap::new(),
        }
    }

    /// Sets the trust entries.
    pub fn with_trust(mut self, trust_levels: BTreeMap<SourceType, f64>) -> Self {
        self.trust_levels = trust_levels;
        self
    }
}
