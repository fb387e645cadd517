//! Step Metrics
//!
//! The model-level record produced once per simulation step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::source::{SourceType, NEUTRAL_TRUST};

/// Population-level measurements taken at the end of a step.
///
/// Step 0 describes the population as initialized, before any step ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub step: u64,
    pub avg_belief: f64,
    pub belief_variance: f64,
    /// Mean trust per source type across all citizens
    pub avg_trust: BTreeMap<SourceType, f64>,
    /// Population variance of trust per source type
    pub trust_variance: BTreeMap<SourceType, f64>,
    pub polarization: f64,
    pub opinion_clusters: usize,
    /// Only present when the scenario declares a ground truth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truth_alignment: Option<f64>,
    /// Content items created by media this step, per source type
    #[serde(default)]
    pub content_published: BTreeMap<SourceType, u32>,
    #[serde(default)]
    pub accepted: u32,
    #[serde(default)]
    pub rejected: u32,
    #[serde(default)]
    pub duplicates: u32,
    #[serde(default)]
    pub shares: u32,
}

impl StepMetrics {
    /// Metrics for a step over an empty population.
    pub fn empty(step: u64) -> Self {
        let neutral: BTreeMap<SourceType, f64> =
            SourceType::ALL.iter().map(|s| (*s, NEUTRAL_TRUST)).collect();
        let zero: BTreeMap<SourceType, f64> = SourceType::ALL.iter().map(|s| (*s, 0.0)).collect();

        Self {
            step,
            avg_belief: 0.0,
            belief_variance: 0.0,
            avg_trust: neutral,
            trust_variance: zero,
            polarization: 0.0,
            opinion_clusters: 0,
            truth_alignment: None,
            content_published: BTreeMap::new(),
            accepted: 0,
            rejected: 0,
            duplicates: 0,
            shares: 0,
        }
    }

    /// Average trust for a source type, neutral if not recorded.
    pub fn trust_in(&self, source: SourceType) -> f64 {
        self.avg_trust.get(&source).copied().unwrap_or(NEUTRAL_TRUST)
    }

    /// Total content items published this step.
    pub fn total_published(&self) -> u32 {
        self.content_published.values().sum()
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub steps: u64,
    pub num_citizens: usize,
    pub num_media: usize,
    pub initial: StepMetrics,
    pub last: StepMetrics,
    pub total_published: u64,
    pub total_accepted: u64,
}

impl RunSummary {
    /// Change in average trust for a source type between start and end.
    pub fn trust_shift(&self, source: SourceType) -> f64 {
        self.last.trust_in(source) - self.initial.trust_in(source)
    }

    /// Change in average belief between start and end.
    pub fn belief_shift(&self) -> f64 {
        self.last.avg_belief - self.initial.avg_belief
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics_are_neutral() {
        let metrics = StepMetrics::empty(3);
        assert_eq!(metrics.step, 3);
        assert_eq!(metrics.trust_in(SourceType::Government), NEUTRAL_TRUST);
        assert_eq!(metrics.opinion_clusters, 0);
        assert_eq!(metrics.total_published(), 0);
    }

    #[test]
    fn test_metrics_json_uses_source_tags() {
        let mut metrics = StepMetrics::empty(1);
        metrics.content_published.insert(SourceType::Corporate, 2);

        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains(r#""corporate":5.0"#));
        assert!(json.contains(r#""content_published":{"corporate":2}"#));
        assert!(!json.contains("truth_alignment"));

        let parsed: StepMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metrics);
    }

    #[test]
    fn test_run_summary_shifts() {
        let initial = StepMetrics::empty(0);
        let mut last = StepMetrics::empty(10);
        last.avg_belief = 0.25;
        last.avg_trust.insert(SourceType::Influencer, 3.5);

        let summary = RunSummary {
            seed: 1,
            steps: 10,
            num_citizens: 0,
            num_media: 0,
            initial,
            last,
            total_published: 0,
            total_accepted: 0,
        };

        assert_eq!(summary.trust_shift(SourceType::Influencer), -1.5);
        assert_eq!(summary.trust_shift(SourceType::Corporate), 0.0);
        assert_eq!(summary.belief_shift(), 0.25);
    }
}
