//! Citizen Components
//!
//! A citizen receives content, decides whether to accept it, and updates its
//! belief, confidence, and per-source trust accordingly. All cross-citizen
//! effects go through the delivery queue; a citizen only ever mutates itself.

use bevy_ecs::prelude::*;
use rand::Rng;
use std::collections::{BTreeMap, HashSet, VecDeque};

use infoflow_events::{CitizenSnapshot, SourceType, NEUTRAL_TRUST};

use super::content::{Content, ContentId, MediaId};
use super::media::MediaAgent;
use crate::config::BehaviorTuning;
use crate::SimContext;

/// Confidence never drops below this through belief shocks.
const CONFIDENCE_FLOOR: f64 = 1.0;

/// Fixed cognitive dispositions drawn at setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CognitiveTraits {
    /// Pursuit of accurate (+) versus comforting (-) information, [-5, 5]
    pub truth_seeking: f64,
    /// [0, 10]
    pub confirmation_bias: f64,
    /// [0, 10]
    pub critical_thinking: f64,
    /// [0, 10]
    pub social_conformity: f64,
    /// Weight of this citizen's belief on its neighbors, [0, 10]
    pub influence: f64,
}

impl Default for CognitiveTraits {
    fn default() -> Self {
        Self {
            truth_seeking: 0.0,
            confirmation_bias: 5.0,
            critical_thinking: 5.0,
            social_conformity: 5.0,
            influence: 5.0,
        }
    }
}

impl CognitiveTraits {
    /// Copy with every trait clamped to its declared range.
    pub fn clamped(self) -> Self {
        Self {
            truth_seeking: self.truth_seeking.clamp(-5.0, 5.0),
            confirmation_bias: self.confirmation_bias.clamp(0.0, 10.0),
            critical_thinking: self.critical_thinking.clamp(0.0, 10.0),
            social_conformity: self.social_conformity.clamp(0.0, 10.0),
            influence: self.influence.clamp(0.0, 10.0),
        }
    }
}

/// Trust per source type, [0, 10]. Unseen types read as neutral.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrustLevels(BTreeMap<SourceType, f64>);

impl TrustLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: SourceType, trust: f64) -> Self {
        self.0.insert(source, trust.clamp(0.0, 10.0));
        self
    }

    pub fn get(&self, source: SourceType) -> f64 {
        self.0.get(&source).copied().unwrap_or(NEUTRAL_TRUST)
    }

    /// Mutable trust for a source, created at neutral on first contact.
    fn entry(&mut self, source: SourceType) -> &mut f64 {
        self.0.entry(source).or_insert(NEUTRAL_TRUST)
    }

    pub fn to_map(&self) -> BTreeMap<SourceType, f64> {
        self.0.clone()
    }
}

/// Result of handing a content item to a citizen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReceiveOutcome {
    Accepted {
        perceived_accuracy: f64,
        belief_delta: f64,
    },
    Rejected,
    /// Already seen; nothing was evaluated
    Duplicate,
}

impl ReceiveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ReceiveOutcome::Accepted { .. })
    }
}

/// Component: A social network user.
#[derive(Component, Debug, Clone)]
pub struct Citizen {
    pub id: usize,
    /// Assessment of the claim's truth, [0, 1]
    pub belief: f64,
    /// [0, 10]
    pub confidence: f64,
    pub traits: CognitiveTraits,
    pub trust: TrustLevels,
    memory: VecDeque<Content>,
    seen: HashSet<ContentId>,
}

impl Citizen {
    pub fn new(id: usize, belief: f64, confidence: f64, traits: CognitiveTraits) -> Self {
        Self {
            id,
            belief: belief.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 10.0),
            traits: traits.clamped(),
            trust: TrustLevels::new(),
            memory: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    pub fn with_trust(mut self, trust: TrustLevels) -> Self {
        self.trust = trust;
        self
    }

    /// Accepted content, oldest first.
    pub fn memory(&self) -> impl Iterator<Item = &Content> {
        self.memory.iter()
    }

    pub fn has_seen(&self, id: ContentId) -> bool {
        self.seen.contains(&id)
    }

    /// Number of distinct content ids this citizen still tracks as seen.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Forgets seen ids for which `still_reachable` is false.
    ///
    /// Only ids that can never be delivered again may be forgotten, or a
    /// repeat would no longer count as a duplicate.
    pub fn forget_seen(&mut self, mut still_reachable: impl FnMut(ContentId) -> bool) {
        self.seen.retain(|id| still_reachable(*id));
    }

    /// Probability of accepting `content`, clamped to [0, 1].
    pub fn acceptance_probability(&self, content: &Content, tuning: &BehaviorTuning) -> f64 {
        let traits = &self.traits;
        let trust_weight = self.trust_weight(content);

        let belief_as_bias = (self.belief - 0.5) * 2.0;
        let alignment = 1.0 - (belief_as_bias - content.framing_bias).abs();
        let confirmation = alignment * traits.confirmation_bias / 10.0
            * (1.0 - traits.critical_thinking * tuning.critical_damping).max(0.0);

        let credibility_signal = (content.source_credibility + content.source_authority) / 2.0;
        let critical = traits.critical_thinking / 10.0 * (credibility_signal - 0.5) * 2.0;

        let score = tuning.trust_weight * trust_weight
            + tuning.confirmation_weight * confirmation
            + tuning.critical_weight * critical
            + tuning.base_acceptance;

        let p = score * content.engagement_factor;
        if p.is_nan() {
            return 0.0;
        }
        p.clamp(0.0, 1.0)
    }

    fn trust_weight(&self, content: &Content) -> f64 {
        self.trust.get(content.source_type) / 10.0
            * content.source_credibility
            * content.authority_factor
    }

    /// Accuracy as this citizen perceives it through the content's framing.
    pub fn perceived_accuracy(&self, content: &Content, tuning: &BehaviorTuning) -> f64 {
        let seeking = (self.traits.truth_seeking + 5.0) / 10.0;
        let distortion =
            content.framing_bias.abs() * tuning.framing_distortion * (1.0 - seeking * 0.5);
        (content.accuracy * (1.0 - distortion)).clamp(0.0, 1.0)
    }

    /// Evaluates a delivered content item.
    ///
    /// A rejection never touches belief, confidence, or trust.
    pub fn receive_information(&mut self, content: &Content, ctx: &mut SimContext) -> ReceiveOutcome {
        if !self.seen.insert(content.id) {
            return ReceiveOutcome::Duplicate;
        }

        let p = self.acceptance_probability(content, &ctx.tuning);
        let roll: f64 = ctx.rng.gen();
        if roll >= p {
            tracing::trace!(
                citizen = self.id,
                content = %content.id,
                p,
                "Rejected content"
            );
            return ReceiveOutcome::Rejected;
        }

        let tuning = &ctx.tuning;
        let perceived = self.perceived_accuracy(content, tuning);
        let old_belief = self.belief;
        let movement = (1.0 - self.confidence / 10.0) * tuning.belief_movement_rate;
        self.belief = (self.belief + (perceived - self.belief) * movement).clamp(0.0, 1.0);
        let belief_delta = self.belief - old_belief;

        if belief_delta.abs() > tuning.confidence_shock_threshold {
            self.confidence =
                (self.confidence - tuning.confidence_loss).max(CONFIDENCE_FLOOR.min(self.confidence));
        } else if self.trust_weight(content) > tuning.confidence_gain_trust {
            self.confidence = (self.confidence + tuning.confidence_gain).min(10.0);
        }

        self.adjust_trust(
            content.source_type,
            perceived,
            content.authority_factor,
            tuning,
        );

        self.memory.push_back(content.clone());
        while self.memory.len() > tuning.memory_capacity {
            self.memory.pop_front();
        }

        tracing::trace!(
            citizen = self.id,
            content = %content.id,
            perceived,
            belief = self.belief,
            "Accepted content"
        );

        ReceiveOutcome::Accepted {
            perceived_accuracy: perceived,
            belief_delta,
        }
    }

    /// Moves trust in `source` by how accurate its content seemed.
    /// Returns the applied change.
    pub fn update_trust(
        &mut self,
        source: SourceType,
        perceived_accuracy: f64,
        tuning: &BehaviorTuning,
    ) -> f64 {
        self.adjust_trust(source, perceived_accuracy, 1.0, tuning)
    }

    fn adjust_trust(
        &mut self,
        source: SourceType,
        perceived_accuracy: f64,
        amplification: f64,
        tuning: &BehaviorTuning,
    ) -> f64 {
        let low = tuning.low_accuracy_threshold;
        let high = tuning.high_accuracy_threshold;
        let impact = if perceived_accuracy < low {
            -1.0 - (low - perceived_accuracy) * tuning.trust_slope
        } else if perceived_accuracy > high {
            1.0 + (perceived_accuracy - high) * tuning.trust_slope
        } else {
            (perceived_accuracy - (low + high) / 2.0) * tuning.neutral_trust_slope
        };
        let critical_factor = 0.5 + self.traits.critical_thinking / 10.0;
        let adjustment = impact * critical_factor * amplification;

        let trust = self.trust.entry(source);
        let before = *trust;
        let after = before + adjustment;
        *trust = if after.is_nan() { before } else { after.clamp(0.0, 10.0) };
        *trust - before
    }

    /// Pulls belief toward the neighborhood average by social conformity.
    pub fn be_influenced_by(&mut self, neighbor_average: f64, tuning: &BehaviorTuning) {
        let pull = self.traits.social_conformity / 10.0 * tuning.social_influence_rate;
        self.belief = (self.belief + (neighbor_average - self.belief) * pull).clamp(0.0, 1.0);
    }

    /// Decides whether to reshare, and what.
    ///
    /// Returns a drifted copy of a remembered item; memory is untouched.
    pub fn share_information(&self, ctx: &mut SimContext) -> Option<Content> {
        if self.memory.is_empty() {
            return None;
        }
        let tuning = &ctx.tuning;
        let p = (self.confidence * tuning.share_rate).clamp(0.0, 1.0);
        if ctx.rng.gen::<f64>() >= p {
            return None;
        }

        let preference = self.framing_preference();
        let cb = self.traits.confirmation_bias;
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (i, item) in self.memory.iter().enumerate() {
            let mut score = 1.0 - (self.belief - item.accuracy).abs();
            if cb > 5.0 {
                let framing_alignment = 1.0 - (item.framing_bias - preference).abs() / 2.0;
                let w = cb / 10.0;
                score = score * (1.0 - w) + framing_alignment * w;
            }
            if score > best_score {
                best = i;
                best_score = score;
            }
        }

        let pick = if ctx.rng.gen::<f64>() < ctx.tuning.share_best_probability {
            best
        } else {
            ctx.rng.gen_range(0..self.memory.len())
        };

        self.memory
            .get(pick)
            .map(|item| item.drifted_toward(self.belief, ctx.tuning.share_drift))
    }

    /// Majority framing direction of remembered content: -1, 0 or 1.
    fn framing_preference(&self) -> f64 {
        let balance: i32 = self
            .memory
            .iter()
            .map(|c| {
                if c.framing_bias > 0.0 {
                    1
                } else if c.framing_bias < 0.0 {
                    -1
                } else {
                    0
                }
            })
            .sum();
        f64::from(balance.signum())
    }

    /// Rolls whether this citizen goes looking for content this step.
    pub fn wants_to_seek(&self, ctx: &mut SimContext) -> bool {
        let drive = self.traits.truth_seeking.abs();
        if drive <= ctx.tuning.seek_threshold {
            return false;
        }
        let p = (ctx.tuning.seek_rate * drive / 5.0).clamp(0.0, 1.0);
        ctx.rng.gen::<f64>() < p
    }

    /// Preference for pulling content from `media`.
    ///
    /// Truth seekers favor trusted, credible sources; truth avoiders favor
    /// sources whose framing matches their belief.
    pub fn seek_weight(&self, media: &MediaAgent) -> f64 {
        if self.traits.truth_seeking > 0.0 {
            return self.trust.get(media.source_type()) / 10.0 * media.credibility / 10.0;
        }

        let framing = self
            .remembered_framing(media.id)
            .unwrap_or_else(|| media.framing_bias());
        let belief_as_bias = (self.belief - 0.5) * 2.0;
        (1.0 - (belief_as_bias - framing).abs() / 2.0).clamp(0.0, 1.0)
    }

    fn remembered_framing(&self, origin: MediaId) -> Option<f64> {
        let (sum, count) = self
            .memory
            .iter()
            .filter(|c| c.origin == origin)
            .fold((0.0, 0usize), |(sum, count), c| (sum + c.framing_bias, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    pub fn to_snapshot(&self, step: u64) -> CitizenSnapshot {
        CitizenSnapshot::new(step, self.id, self.belief, self.confidence)
            .with_trust(self.trust.to_map())
    }
}

/// Influence-weighted mean of `(belief, influence)` pairs.
///
/// `None` when there are no pairs or no neighbor carries any influence.
pub fn influence_weighted_average(pairs: impl IntoIterator<Item = (f64, f64)>) -> Option<f64> {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for (belief, influence) in pairs {
        weighted += belief * influence;
        total_weight += influence;
    }
    if total_weight > 0.0 {
        Some(weighted / total_weight)
    } else {
        None
    }
}
