// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod decision;
pub mod engine;
pub mod evidence;
pub mod telemetry;

// Pipeline stages (normalize, kill switches, combiner, explanation)
pub mod analyze;

// ---- Re-exports for stable public API ----
// Router builder: `crate_root::api::router` and `crate_root::router`
pub use crate::api::{router, AppState};
pub use crate::config::EngineConfig;
pub use crate::decision::{RiskLevel, RiskVerdict, VerdictConfidence};
pub use crate::engine::VerdictEngine;
pub use crate::evidence::EvidenceBundle;
