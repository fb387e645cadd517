//! Content Components
//!
//! Content items produced by media agents, and the ledger that numbers them.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use infoflow_events::SourceType;

/// Unique, monotonically assigned content identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub u64);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content_{}", self.0)
    }
}

/// Identifier of a media agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaId(pub usize);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "media_{}", self.0)
    }
}

/// Who handed a content item to a citizen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Media(MediaId),
    Citizen(usize),
}

/// A single piece of information.
///
/// Immutable once created; a reshare produces a drifted copy carrying the
/// same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    /// How true the content is, [0, 1]
    pub accuracy: f64,
    /// Ideological slant, [-1, 1]
    pub framing_bias: f64,
    /// Perceived legitimacy of the producer, [0, 1]
    pub source_authority: f64,
    /// Perceived reliability of the producer, [0, 1]
    pub source_credibility: f64,
    pub source_type: SourceType,
    pub origin: MediaId,
    pub created_step: u64,
    /// Multiplies the acceptance probability
    pub engagement_factor: f64,
    /// Multiplies trust weight and trust adjustments
    pub authority_factor: f64,
}

impl Content {
    /// Copy of this content with accuracy pulled toward `belief`.
    pub fn drifted_toward(&self, belief: f64, drift: f64) -> Self {
        let mut copy = self.clone();
        copy.accuracy = (self.accuracy + (belief - self.accuracy) * drift).clamp(0.0, 1.0);
        copy
    }
}

/// Resource: Issues content ids and counts publications per step.
#[derive(Resource, Debug, Default)]
pub struct ContentLedger {
    next_id: u64,
    published: BTreeMap<SourceType, u32>,
}

impl ContentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next id for a new item from `source`.
    pub fn issue(&mut self, source: SourceType) -> ContentId {
        let id = ContentId(self.next_id);
        self.next_id += 1;
        *self.published.entry(source).or_default() += 1;
        id
    }

    /// Total items ever issued.
    pub fn total_issued(&self) -> u64 {
        self.next_id
    }

    /// Publications recorded since the last call.
    pub fn take_step_counts(&mut self) -> BTreeMap<SourceType, u32> {
        std::mem::take(&mut self.published)
    }
}
