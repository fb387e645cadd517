//! Media Agent Components
//!
//! Corporate outlets, influencers and government media share one component
//! and differ through [`MediaKind`].

use bevy_ecs::prelude::*;
use rand::seq::index;
use rand::Rng;
use std::collections::BTreeSet;

use infoflow_events::SourceType;

use super::content::{Content, ContentId, ContentLedger, MediaId};
use crate::SimContext;

/// Variant-specific behavior of a media agent.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaKind {
    /// Institutional outlet with wide random reach
    Corporate,
    /// Personality with a follower base and boosted engagement
    Influencer {
        engagement_factor: f64,
        followers: BTreeSet<usize>,
    },
    /// State outlet whose authority amplifies trust effects
    Government,
}

/// Component: A content producer. Media agents are not graph nodes.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct MediaAgent {
    pub id: MediaId,
    pub kind: MediaKind,
    /// Political slant, [-5, 5]
    pub political_bias: f64,
    /// [0, 10]
    pub credibility: f64,
    /// [0, 10]
    pub authority: f64,
    /// Commitment to accurate reporting, [0, 10]
    pub truth_commitment: f64,
    /// Chance of publishing in a step, [0, 1]
    pub publication_rate: f64,
    /// Fraction of the population a broadcast reaches, [0, 1]
    pub influence_reach: f64,
}

impl MediaAgent {
    pub fn new(id: MediaId, kind: MediaKind) -> Self {
        Self {
            id,
            kind,
            political_bias: 0.0,
            credibility: 5.0,
            authority: 5.0,
            truth_commitment: 5.0,
            publication_rate: 0.5,
            influence_reach: 0.5,
        }
    }

    pub fn corporate(id: MediaId) -> Self {
        Self::new(id, MediaKind::Corporate)
    }

    pub fn influencer(id: MediaId, engagement_factor: f64) -> Self {
        Self::new(
            id,
            MediaKind::Influencer {
                engagement_factor,
                followers: BTreeSet::new(),
            },
        )
    }

    pub fn government(id: MediaId) -> Self {
        Self::new(id, MediaKind::Government)
    }

    pub fn with_bias(mut self, political_bias: f64) -> Self {
        self.political_bias = political_bias.clamp(-5.0, 5.0);
        self
    }

    pub fn with_credibility(mut self, credibility: f64) -> Self {
        self.credibility = credibility.clamp(0.0, 10.0);
        self
    }

    pub fn with_authority(mut self, authority: f64) -> Self {
        self.authority = authority.clamp(0.0, 10.0);
        self
    }

    pub fn with_truth_commitment(mut self, truth_commitment: f64) -> Self {
        self.truth_commitment = truth_commitment.clamp(0.0, 10.0);
        self
    }

    pub fn with_publication_rate(mut self, rate: f64) -> Self {
        self.publication_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_influence_reach(mut self, reach: f64) -> Self {
        self.influence_reach = reach.clamp(0.0, 1.0);
        self
    }

    /// Replaces the follower set; ignored for non-influencers.
    pub fn with_followers(mut self, new_followers: BTreeSet<usize>) -> Self {
        if let MediaKind::Influencer { followers, .. } = &mut self.kind {
            *followers = new_followers;
        }
        self
    }

    pub fn source_type(&self) -> SourceType {
        match self.kind {
            MediaKind::Corporate => SourceType::Corporate,
            MediaKind::Influencer { .. } => SourceType::Influencer,
            MediaKind::Government => SourceType::Government,
        }
    }

    pub fn followers(&self) -> Option<&BTreeSet<usize>> {
        match &self.kind {
            MediaKind::Influencer { followers, .. } => Some(followers),
            _ => None,
        }
    }

    /// Political bias scaled into [-1, 1].
    pub fn framing_bias(&self) -> f64 {
        (self.political_bias / 5.0).clamp(-1.0, 1.0)
    }

    /// Expected accuracy before noise, rising with truth commitment.
    pub fn expected_accuracy(&self) -> f64 {
        let tc = self.truth_commitment;
        if tc < 3.0 {
            0.3 * tc / 10.0
        } else if tc > 7.0 {
            0.7 + 0.2 * (tc - 7.0) / 10.0
        } else {
            0.3 + 0.4 * (tc - 3.0) / 4.0
        }
    }

    pub fn engagement_factor(&self) -> f64 {
        match self.kind {
            MediaKind::Influencer {
                engagement_factor, ..
            } => engagement_factor,
            _ => 1.0,
        }
    }

    /// Trust amplification of government content; 1.0 for everyone else.
    pub fn authority_factor(&self) -> f64 {
        if self.kind != MediaKind::Government {
            return 1.0;
        }
        let tc = self.truth_commitment;
        if tc < 3.0 {
            0.5 + 0.3 * tc / 3.0
        } else if tc > 7.0 {
            1.2 + 0.3 * (tc - 7.0) / 3.0
        } else {
            0.8 + 0.4 * (tc - 3.0) / 4.0
        }
    }

    /// Produces a fresh content item. Accuracy carries ±0.1 of noise.
    pub fn create_content(&self, id: ContentId, step: u64, ctx: &mut SimContext) -> Content {
        let noise: f64 = ctx.rng.gen_range(-0.1..=0.1);
        Content {
            id,
            accuracy: (self.expected_accuracy() + noise).clamp(0.0, 1.0),
            framing_bias: self.framing_bias(),
            source_authority: self.authority / 10.0,
            source_credibility: self.credibility / 10.0,
            source_type: self.source_type(),
            origin: self.id,
            created_step: step,
            engagement_factor: self.engagement_factor(),
            authority_factor: self.authority_factor(),
        }
    }

    /// Publishes with probability `publication_rate`.
    ///
    /// When the trial fails nothing is created and no id is consumed.
    pub fn publish_content(
        &self,
        ledger: &mut ContentLedger,
        step: u64,
        ctx: &mut SimContext,
    ) -> Option<Content> {
        if ctx.rng.gen::<f64>() >= self.publication_rate {
            return None;
        }
        let id = ledger.issue(self.source_type());
        Some(self.create_content(id, step, ctx))
    }

    /// Citizens a broadcast reaches, in ascending id order.
    pub fn broadcast_targets(&self, num_citizens: usize, ctx: &mut SimContext) -> Vec<usize> {
        if num_citizens == 0 {
            return Vec::new();
        }

        let mut targets = match &self.kind {
            MediaKind::Influencer { followers, .. } => {
                let outsiders: Vec<usize> =
                    (0..num_citizens).filter(|c| !followers.contains(c)).collect();
                let spill = (outsiders.len() as f64 * self.influence_reach / 2.0).floor() as usize;
                let mut reached: Vec<usize> =
                    followers.iter().copied().filter(|&c| c < num_citizens).collect();
                reached.extend(
                    index::sample(&mut ctx.rng, outsiders.len(), spill)
                        .into_iter()
                        .map(|i| outsiders[i]),
                );
                reached
            }
            MediaKind::Corporate | MediaKind::Government => {
                let size = (num_citizens as f64 * self.influence_reach).floor() as usize;
                index::sample(&mut ctx.rng, num_citizens, size.min(num_citizens)).into_vec()
            }
        };

        targets.sort_unstable();
        targets
    }
}

/// Draws a follower set sized between the given population fractions.
///
/// The count is uniform in `[max(1, min_fraction·n), max(2, max_fraction·n)]`,
/// capped at the population.
pub fn pick_followers(
    num_citizens: usize,
    min_fraction: f64,
    max_fraction: f64,
    ctx: &mut SimContext,
) -> BTreeSet<usize> {
    if num_citizens == 0 {
        return BTreeSet::new();
    }
    let hi = ((num_citizens as f64 * max_fraction).floor() as usize)
        .max(2)
        .min(num_citizens);
    let lo = ((num_citizens as f64 * min_fraction).floor() as usize)
        .max(1)
        .min(hi);
    let count = ctx.rng.gen_range(lo..=hi);

    index::sample(&mut ctx.rng, num_citizens, count)
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_curve_rises_with_commitment() {
        let mut previous = -1.0;
        for tc in 0..=10 {
            let media = MediaAgent::corporate(MediaId(0)).with_truth_commitment(tc as f64);
            let accuracy = media.expected_accuracy();
            assert!(accuracy >= previous, "curve dipped at {}", tc);
            previous = accuracy;
        }
        let honest = MediaAgent::corporate(MediaId(0)).with_truth_commitment(10.0);
        assert!((honest.expected_accuracy() - 0.76).abs() < 1e-12);
    }

    #[test]
    fn test_framing_bias_scaling() {
        let media = MediaAgent::corporate(MediaId(0)).with_bias(-2.5);
        assert_eq!(media.framing_bias(), -0.5);
        let extreme = MediaAgent::corporate(MediaId(0)).with_bias(9.0);
        assert_eq!(extreme.framing_bias(), 1.0);
    }

    #[test]
    fn test_authority_factor_only_for_government() {
        let corporate = MediaAgent::corporate(MediaId(0)).with_truth_commitment(10.0);
        assert_eq!(corporate.authority_factor(), 1.0);

        let honest = MediaAgent::government(MediaId(1)).with_truth_commitment(10.0);
        assert!((honest.authority_factor() - 1.5).abs() < 1e-12);
        let captured = MediaAgent::government(MediaId(1)).with_truth_commitment(0.0);
        assert!((captured.authority_factor() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_content_carries_source_metadata() {
        let mut ctx = SimContext::seeded(4);
        let media = MediaAgent::influencer(MediaId(2), 1.5)
            .with_bias(4.0)
            .with_credibility(5.0)
            .with_authority(4.0);
        let content = media.create_content(ContentId(9), 3, &mut ctx);

        assert_eq!(content.source_type, SourceType::Influencer);
        assert_eq!(content.origin, MediaId(2));
        assert_eq!(content.created_step, 3);
        assert_eq!(content.engagement_factor, 1.5);
        assert!((content.framing_bias - 0.8).abs() < 1e-12);
        assert!((content.source_authority - 0.4).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&content.accuracy));
        assert!((content.accuracy - media.expected_accuracy()).abs() <= 0.1 + 1e-12);
    }

    #[test]
    fn test_publication_gate() {
        let mut ctx = SimContext::seeded(1);
        let mut ledger = ContentLedger::new();

        let silent = MediaAgent::corporate(MediaId(0)).with_publication_rate(0.0);
        for _ in 0..50 {
            assert!(silent.publish_content(&mut ledger, 1, &mut ctx).is_none());
        }
        assert_eq!(ledger.total_issued(), 0);

        let eager = MediaAgent::corporate(MediaId(1)).with_publication_rate(1.0);
        for _ in 0..50 {
            assert!(eager.publish_content(&mut ledger, 1, &mut ctx).is_some());
        }
        assert_eq!(ledger.total_issued(), 50);
    }

    #[test]
    fn test_corporate_reach_size() {
        let mut ctx = SimContext::seeded(2);
        let media = MediaAgent::corporate(MediaId(0)).with_influence_reach(0.7);
        let targets = media.broadcast_targets(100, &mut ctx);
        assert_eq!(targets.len(), 70);
        assert!(targets.windows(2).all(|w| w[0] < w[1]));
        assert!(targets.iter().all(|&t| t < 100));
    }

    #[test]
    fn test_influencer_reaches_all_followers() {
        let mut ctx = SimContext::seeded(3);
        let followers: BTreeSet<usize> = [1, 5, 7].into_iter().collect();
        let media = MediaAgent::influencer(MediaId(0), 1.5)
            .with_influence_reach(0.6)
            .with_followers(followers.clone());

        let targets = media.broadcast_targets(20, &mut ctx);
        for follower in &followers {
            assert!(targets.contains(follower));
        }
        // 17 outsiders * 0.6 / 2 = 5 extra citizens
        assert_eq!(targets.len(), 3 + 5);
    }

    #[test]
    fn test_pick_followers_bounds() {
        let mut ctx = SimContext::seeded(5);
        for _ in 0..20 {
            let followers = pick_followers(100, 0.05, 0.2, &mut ctx);
            assert!((5..=20).contains(&followers.len()));
        }
        let tiny = pick_followers(1, 0.05, 0.2, &mut ctx);
        assert_eq!(tiny.len(), 1);
        assert!(pick_followers(0, 0.05, 0.2, &mut ctx).is_empty());
    }
}
