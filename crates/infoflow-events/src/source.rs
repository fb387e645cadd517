//! Source Types
//!
//! Tags identifying which kind of media agent produced a piece of content.
//! Citizens track one trust value per tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trust assigned to a source type a citizen has never encountered.
pub const NEUTRAL_TRUST: f64 = 5.0;

/// The kind of media agent behind a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Established outlets with broad, untargeted reach
    Corporate,
    /// Individual accounts with a dedicated follower base
    Influencer,
    /// Official government channels
    Government,
}

impl SourceType {
    /// Every source type, in a stable order.
    pub const ALL: [SourceType; 3] = [
        SourceType::Corporate,
        SourceType::Influencer,
        SourceType::Government,
    ];

    /// Stable lowercase tag used in records and config keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Corporate => "corporate",
            SourceType::Influencer => "influencer",
            SourceType::Government => "government",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a source type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSourceType(pub String);

impl fmt::Display for UnknownSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown source type: {}", self.0)
    }
}

impl std::error::Error for UnknownSourceType {}

impl FromStr for SourceType {
    type Err = UnknownSourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "corporate" => Ok(SourceType::Corporate),
            "influencer" => Ok(SourceType::Influencer),
            "government" => Ok(SourceType::Government),
            other => Err(UnknownSourceType(other.to_string())),
        }
    }
}
