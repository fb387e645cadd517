//! Scenario Configuration
//!
//! A scenario is one flat table of named parameters. Every key is optional;
//! omitted keys take the defaults below. Behavioral coefficients live in a
//! nested `[tuning]` table.

use serde::{Deserialize, Serialize};
use std::path::Path;

use infoflow_events::{SourceType, NEUTRAL_TRUST};

use crate::error::ConfigError;
use crate::network::{NetworkParams, NetworkType};

/// Complete scenario description consumed by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    // Population
    pub num_citizens: usize,
    pub num_corporate_media: usize,
    pub num_influencers: usize,
    pub num_government_media: usize,

    // Network
    pub network_type: NetworkType,
    pub small_world_k: usize,
    pub small_world_p: f64,
    pub scale_free_m: usize,
    pub random_p: f64,

    // Citizen distributions
    /// Mean of the normal distribution truth seeking is drawn from
    pub truth_seeking_mean: f64,
    pub truth_seeking_std: f64,
    pub confirmation_bias_min: f64,
    pub confirmation_bias_max: f64,
    pub critical_thinking_min: f64,
    pub critical_thinking_max: f64,
    pub social_conformity_min: f64,
    pub social_conformity_max: f64,
    pub influence_min: f64,
    pub influence_max: f64,
    /// Fixed starting belief for every citizen; uniform in [0, 1] when unset
    pub initial_belief: Option<f64>,
    pub initial_confidence: f64,
    pub initial_trust_corporate: f64,
    pub initial_trust_influencer: f64,
    pub initial_trust_government: f64,

    // Media
    pub corporate_bias_min: f64,
    pub corporate_bias_max: f64,
    pub influencer_bias_min: f64,
    pub influencer_bias_max: f64,
    pub government_bias: f64,
    pub corporate_truth_commitment: f64,
    pub influencer_truth_commitment: f64,
    pub government_truth_commitment: f64,
    pub corporate_publication_rate: f64,
    pub influencer_publication_rate: f64,
    pub government_publication_rate: f64,
    pub corporate_influence_reach: f64,
    pub influencer_influence_reach: f64,
    pub government_influence_reach: f64,
    pub corporate_credibility: f64,
    pub corporate_authority: f64,
    pub influencer_credibility: f64,
    pub influencer_authority: f64,
    pub government_credibility: f64,
    pub government_authority: f64,
    /// Acceptance multiplier carried by influencer content
    pub influencer_engagement_factor: f64,
    /// Follower count bounds as fractions of the citizen population
    pub follower_fraction_min: f64,
    pub follower_fraction_max: f64,

    // Metrics and output
    pub opinion_cluster_threshold: f64,
    /// External reference truth for the truth alignment metric
    pub ground_truth: Option<f64>,
    /// Record a per-citizen snapshot every step
    pub track_agents: bool,

    pub tuning: BehaviorTuning,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            num_citizens: 100,
            num_corporate_media: 3,
            num_influencers: 5,
            num_government_media: 1,

            network_type: NetworkType::SmallWorld,
            small_world_k: 4,
            small_world_p: 0.1,
            scale_free_m: 3,
            random_p: 0.1,

            truth_seeking_mean: 1.0,
            truth_seeking_std: 2.0,
            confirmation_bias_min: 4.0,
            confirmation_bias_max: 7.0,
            critical_thinking_min: 4.0,
            critical_thinking_max: 7.0,
            social_conformity_min: 4.0,
            social_conformity_max: 7.0,
            influence_min: 1.0,
            influence_max: 10.0,
            initial_belief: None,
            initial_confidence: 5.0,
            initial_trust_corporate: NEUTRAL_TRUST,
            initial_trust_influencer: NEUTRAL_TRUST,
            initial_trust_government: NEUTRAL_TRUST,

            corporate_bias_min: -3.0,
            corporate_bias_max: 3.0,
            influencer_bias_min: -4.0,
            influencer_bias_max: 4.0,
            government_bias: 1.0,
            corporate_truth_commitment: 6.0,
            influencer_truth_commitment: 4.0,
            government_truth_commitment: 5.0,
            corporate_publication_rate: 0.8,
            influencer_publication_rate: 0.9,
            government_publication_rate: 0.7,
            corporate_influence_reach: 0.7,
            influencer_influence_reach: 0.6,
            government_influence_reach: 0.7,
            corporate_credibility: 7.0,
            corporate_authority: 7.0,
            influencer_credibility: 5.0,
            influencer_authority: 4.0,
            government_credibility: 6.0,
            government_authority: 9.0,
            influencer_engagement_factor: 1.5,
            follower_fraction_min: 0.05,
            follower_fraction_max: 0.2,

            opinion_cluster_threshold: 0.1,
            ground_truth: None,
            track_agents: false,

            tuning: BehaviorTuning::default(),
        }
    }
}

/// Coefficients of the citizen decision rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Weight of source trust in the acceptance score
    pub trust_weight: f64,
    /// Weight of belief alignment in the acceptance score
    pub confirmation_weight: f64,
    /// Weight of the credibility signal in the acceptance score
    pub critical_weight: f64,
    /// Floor added to every acceptance score
    pub base_acceptance: f64,
    /// Fraction of confirmation pull removed per point of critical thinking
    pub critical_damping: f64,
    /// Perceived accuracy lost at maximal framing
    pub framing_distortion: f64,
    /// Belief movement toward perceived accuracy at zero confidence
    pub belief_movement_rate: f64,
    /// Belief change above which confidence drops
    pub confidence_shock_threshold: f64,
    pub confidence_loss: f64,
    pub confidence_gain: f64,
    /// Trust weight above which steady content builds confidence
    pub confidence_gain_trust: f64,
    /// Perceived accuracy below this is a betrayal of trust
    pub low_accuracy_threshold: f64,
    /// Perceived accuracy above this is a confirmation of trust
    pub high_accuracy_threshold: f64,
    /// Extra trust moved per unit of accuracy beyond either threshold
    pub trust_slope: f64,
    /// Trust moved per unit of accuracy inside the neutral band
    pub neutral_trust_slope: f64,
    /// Neighbor pull per step at full social conformity
    pub social_influence_rate: f64,
    /// Share probability per point of confidence
    pub share_rate: f64,
    /// Share of the gap to the sharer's belief absorbed by reshared accuracy
    pub share_drift: f64,
    /// Chance of resharing the best-aligned memory instead of a random one
    pub share_best_probability: f64,
    /// Accepted items remembered per citizen
    pub memory_capacity: usize,
    /// Minimum |truth seeking| before a citizen goes looking for content
    pub seek_threshold: f64,
    /// Seeking probability per point of |truth seeking|, divided by five
    pub seek_rate: f64,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            trust_weight: 0.4,
            confirmation_weight: 0.4,
            critical_weight: 0.2,
            base_acceptance: 0.2,
            critical_damping: 0.05,
            framing_distortion: 0.5,
            belief_movement_rate: 0.3,
            confidence_shock_threshold: 0.1,
            confidence_loss: 0.5,
            confidence_gain: 0.3,
            confidence_gain_trust: 0.7,
            low_accuracy_threshold: 0.4,
            high_accuracy_threshold: 0.6,
            trust_slope: 5.0,
            neutral_trust_slope: 4.0,
            social_influence_rate: 0.1,
            share_rate: 0.05,
            share_drift: 0.1,
            share_best_probability: 0.8,
            memory_capacity: 10,
            seek_threshold: 1.0,
            seek_rate: 0.1,
        }
    }
}

impl ScenarioConfig {
    /// Loads a scenario file, choosing JSON for `.json` and TOML otherwise.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Parses and validates a TOML scenario.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON scenario.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the scenario as TOML, e.g. to seed a new scenario file.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Network density parameters in the builder's shape.
    pub fn network_params(&self) -> NetworkParams {
        NetworkParams {
            small_world_k: self.small_world_k,
            small_world_p: self.small_world_p,
            scale_free_m: self.scale_free_m,
            random_p: self.random_p,
        }
    }

    /// Starting trust a citizen holds toward a source type.
    pub fn initial_trust(&self, source: SourceType) -> f64 {
        match source {
            SourceType::Corporate => self.initial_trust_corporate,
            SourceType::Influencer => self.initial_trust_influencer,
            SourceType::Government => self.initial_trust_government,
        }
    }

    pub fn num_media(&self) -> usize {
        self.num_corporate_media + self.num_influencers + self.num_government_media
    }

    /// Rejects structurally invalid scenarios.
    ///
    /// Graph parameters that only conflict with the population size are
    /// checked by the network builder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tuning;

        finite("truth_seeking_mean", self.truth_seeking_mean)?;
        in_range("truth_seeking_mean", self.truth_seeking_mean, -5.0, 5.0)?;
        finite("truth_seeking_std", self.truth_seeking_std)?;
        if self.truth_seeking_std < 0.0 {
            return Err(ConfigError::invalid(
                "truth_seeking_std",
                format!("standard deviation {} is negative", self.truth_seeking_std),
            ));
        }

        range_pair(
            "confirmation_bias",
            self.confirmation_bias_min,
            self.confirmation_bias_max,
            0.0,
            10.0,
        )?;
        range_pair(
            "critical_thinking",
            self.critical_thinking_min,
            self.critical_thinking_max,
            0.0,
            10.0,
        )?;
        range_pair(
            "social_conformity",
            self.social_conformity_min,
            self.social_conformity_max,
            0.0,
            10.0,
        )?;
        range_pair("influence", self.influence_min, self.influence_max, 0.0, 10.0)?;
        range_pair(
            "corporate_bias",
            self.corporate_bias_min,
            self.corporate_bias_max,
            -5.0,
            5.0,
        )?;
        range_pair(
            "influencer_bias",
            self.influencer_bias_min,
            self.influencer_bias_max,
            -5.0,
            5.0,
        )?;
        range_pair(
            "follower_fraction",
            self.follower_fraction_min,
            self.follower_fraction_max,
            0.0,
            1.0,
        )?;

        if let Some(belief) = self.initial_belief {
            in_range("initial_belief", belief, 0.0, 1.0)?;
        }
        in_range("initial_confidence", self.initial_confidence, 0.0, 10.0)?;
        for source in SourceType::ALL {
            let name = match source {
                SourceType::Corporate => "initial_trust_corporate",
                SourceType::Influencer => "initial_trust_influencer",
                SourceType::Government => "initial_trust_government",
            };
            in_range(name, self.initial_trust(source), 0.0, 10.0)?;
        }

        in_range("government_bias", self.government_bias, -5.0, 5.0)?;
        for (name, value) in [
            ("corporate_truth_commitment", self.corporate_truth_commitment),
            ("influencer_truth_commitment", self.influencer_truth_commitment),
            ("government_truth_commitment", self.government_truth_commitment),
            ("corporate_credibility", self.corporate_credibility),
            ("corporate_authority", self.corporate_authority),
            ("influencer_credibility", self.influencer_credibility),
            ("influencer_authority", self.influencer_authority),
            ("government_credibility", self.government_credibility),
            ("government_authority", self.government_authority),
        ] {
            in_range(name, value, 0.0, 10.0)?;
        }
        for (name, value) in [
            ("corporate_publication_rate", self.corporate_publication_rate),
            ("influencer_publication_rate", self.influencer_publication_rate),
            ("government_publication_rate", self.government_publication_rate),
            ("corporate_influence_reach", self.corporate_influence_reach),
            ("influencer_influence_reach", self.influencer_influence_reach),
            ("government_influence_reach", self.government_influence_reach),
            ("small_world_p", self.small_world_p),
            ("random_p", self.random_p),
        ] {
            in_range(name, value, 0.0, 1.0)?;
        }

        finite("influencer_engagement_factor", self.influencer_engagement_factor)?;
        if self.influencer_engagement_factor < 0.0 {
            return Err(ConfigError::invalid(
                "influencer_engagement_factor",
                "must not be negative",
            ));
        }

        finite("opinion_cluster_threshold", self.opinion_cluster_threshold)?;
        if self.opinion_cluster_threshold < 0.0 {
            return Err(ConfigError::invalid(
                "opinion_cluster_threshold",
                "must not be negative",
            ));
        }
        if let Some(truth) = self.ground_truth {
            in_range("ground_truth", truth, 0.0, 1.0)?;
        }

        for (name, value) in [
            ("tuning.trust_weight", t.trust_weight),
            ("tuning.confirmation_weight", t.confirmation_weight),
            ("tuning.critical_weight", t.critical_weight),
            ("tuning.base_acceptance", t.base_acceptance),
            ("tuning.critical_damping", t.critical_damping),
            ("tuning.trust_slope", t.trust_slope),
            ("tuning.neutral_trust_slope", t.neutral_trust_slope),
            ("tuning.confidence_loss", t.confidence_loss),
            ("tuning.confidence_gain", t.confidence_gain),
            ("tuning.share_rate", t.share_rate),
            ("tuning.seek_rate", t.seek_rate),
            ("tuning.seek_threshold", t.seek_threshold),
            ("tuning.confidence_shock_threshold", t.confidence_shock_threshold),
            ("tuning.confidence_gain_trust", t.confidence_gain_trust),
        ] {
            finite(name, value)?;
            if value < 0.0 {
                return Err(ConfigError::invalid(name, "must not be negative"));
            }
        }
        for (name, value) in [
            ("tuning.framing_distortion", t.framing_distortion),
            ("tuning.belief_movement_rate", t.belief_movement_rate),
            ("tuning.social_influence_rate", t.social_influence_rate),
            ("tuning.share_drift", t.share_drift),
            ("tuning.share_best_probability", t.share_best_probability),
        ] {
            in_range(name, value, 0.0, 1.0)?;
        }
        range_pair(
            "tuning.accuracy_threshold",
            t.low_accuracy_threshold,
            t.high_accuracy_threshold,
            0.0,
            1.0,
        )?;
        if t.memory_capacity == 0 {
            return Err(ConfigError::invalid(
                "tuning.memory_capacity",
                "must hold at least one item",
            ));
        }

        Ok(())
    }
}

fn finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, format!("{} is not finite", value)))
    }
}

fn in_range(name: &str, value: f64, lo: f64, hi: f64) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value < lo || value > hi {
        return Err(ConfigError::invalid(
            name,
            format!("{} is outside [{}, {}]", value, lo, hi),
        ));
    }
    Ok(())
}

fn range_pair(name: &str, min: f64, max: f64, lo: f64, hi: f64) -> Result<(), ConfigError> {
    in_range(&format!("{}_min", name), min, lo, hi)?;
    in_range(&format!("{}_max", name), max, lo, hi)?;
    if min > max {
        return Err(ConfigError::invalid(
            name,
            format!("range is inverted: min {} > max {}", min, max),
        ));
    }
    Ok(())
}
