//! Core primitives.
//!
//! Identifier newtypes and the read-only check-state seam shared by
//! every other module.

pub mod ids;
pub mod checks;

// Re-export core types
pub use ids::{SlotId, TeamId, LocationId, ItemId, ItemFlags};
pub use checks::{CheckState, CheckTable};
