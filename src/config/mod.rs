// src/config/mod.rs
//! Engine configuration: weights, level thresholds, kill-switch scores and
//! signal floors, loaded once and shared immutably.

pub mod engine;

pub use engine::{
    CategoryWeights, EngineConfig, KillSwitchConfig, LevelThresholds, NegativeProofConfig,
    SignalConfig, ZeroFootprintPolicy, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH,
    ENV_NEGATIVE_PROOF_FLOOR, ENV_ZERO_FOOTPRINT_POLICY,
};
