// src/analyze/mod.rs
//! Analysis pipeline stages:
//! normalize → kill switches → weighted combiner → verdict & explanation.

pub mod combiner;
pub mod explain;
pub mod kill_switch;
pub mod normalize;

// Re-export convenient types.
pub use crate::analyze::combiner::{CategoryRisks, CombinedRisk, RiskCombiner};
pub use crate::analyze::explain::build_verdict;
pub use crate::analyze::kill_switch::{KillSwitchOutcome, KillSwitchRule};
pub use crate::analyze::normalize::{normalize, AiSource, NormalizedEvidence};
