//! Output Generation
//!
//! Population metrics and the per-step record history.

pub mod metrics;
pub mod stats;

pub use metrics::*;
pub use stats::*;
