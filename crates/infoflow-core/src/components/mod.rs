//! ECS Components
//!
//! Citizens, media agents, and the content that flows between them.

pub mod citizen;
pub mod content;
pub mod media;

pub use citizen::*;
pub use content::*;
pub use media::*;
