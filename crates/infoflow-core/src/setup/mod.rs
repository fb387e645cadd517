//! World Setup
//!
//! Population and media spawning.

pub mod population;

pub use population::*;
