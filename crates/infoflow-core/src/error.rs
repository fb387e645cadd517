//! Error Types
//!
//! Configuration problems fail fast at model construction. Numerical edge
//! cases inside a step are clamped locally and never reach these types.

use std::path::PathBuf;

/// Errors raised while loading or validating a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not read the configuration file
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML text could not be parsed into a scenario
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON text could not be parsed into a scenario
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A parameter is structurally invalid
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl ConfigError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the network builder.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    /// Graph parameters incompatible with the population
    #[error("invalid {network} parameter `{name}`: {reason}")]
    InvalidParameter {
        network: &'static str,
        name: &'static str,
        reason: String,
    },
}

/// Errors surfaced by the simulation model.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// A step observed state that should be impossible; the run cannot continue
    #[error("inconsistent simulation state at step {step}: {detail}")]
    Inconsistent { step: u64, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = ConfigError::invalid("num_citizens", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid parameter `num_citizens`: must be positive"
        );
    }

    #[test]
    fn test_network_error_converts_to_sim_error() {
        let err = NetworkError::InvalidParameter {
            network: "small_world",
            name: "k",
            reason: "k (10) must be smaller than the population (5)".to_string(),
        };
        let sim: SimError = err.into();
        assert!(sim.to_string().contains("small_world"));
        assert!(matches!(sim, SimError::Network(_)));
    }
}
