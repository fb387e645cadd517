//! Shared record types for the information-flow simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is the contract between the engine and anything that consumes its
//! output (exporters, charts, dashboards).

pub mod metrics;
pub mod snapshot;
pub mod source;

// Re-export source types
pub use source::{SourceType, NEUTRAL_TRUST};

// Re-export per-step records
pub use metrics::{RunSummary, StepMetrics};

// Re-export per-agent records
pub use snapshot::CitizenSnapshot;
