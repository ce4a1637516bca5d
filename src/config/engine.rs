// src/config/engine.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, io, path::PathBuf};
use tracing::{info, warn};

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";

pub const ENV_CONFIG_PATH: &str = "VERDICT_CONFIG_PATH";
pub const ENV_ZERO_FOOTPRINT_POLICY: &str = "VERDICT_ZERO_FOOTPRINT_POLICY";
pub const ENV_NEGATIVE_PROOF_FLOOR: &str = "VERDICT_NEGATIVE_PROOF_FLOOR";

/// Full engine configuration. Every section has serde defaults, so a partial
/// TOML file (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: CategoryWeights,
    pub levels: LevelThresholds,
    pub kill_switch: KillSwitchConfig,
    pub signals: SignalConfig,
    pub negative_proof: NegativeProofConfig,
}

/// Category weights for the weighted combiner. Re-normalized to sum 1.0 by
/// [`EngineConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub integrity: f64,
    pub ai_generation: f64,
    pub deception: f64,
    pub technical: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            integrity: 0.15,
            ai_generation: 0.35,
            deception: 0.30,
            technical: 0.20,
        }
    }
}

impl CategoryWeights {
    pub fn sum(&self) -> f64 {
        self.integrity + self.ai_generation + self.deception + self.technical
    }

    fn as_array(&self) -> [f64; 4] {
        [
            self.integrity,
            self.ai_generation,
            self.deception,
            self.technical,
        ]
    }
}

/// Exclusive lower bounds: `score > critical_above` is CRITICAL, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelThresholds {
    pub critical_above: u8,
    pub high_above: u8,
    pub suspicious_above: u8,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            critical_above: 85,
            high_above: 60,
            suspicious_above: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillSwitchConfig {
    pub local_signature: u8,
    pub stock_photo: u8,
    pub synthetic_audio: u8,
    /// Highest spectral cutoff (Hz) still consistent with legacy speech-synthesis encoding.
    pub legacy_cutoff_hz: f64,
}

impl Default for KillSwitchConfig {
    fn default() -> Self {
        Self {
            local_signature: 100,
            stock_photo: 95,
            synthetic_audio: 90,
            legacy_cutoff_hz: 8000.0,
        }
    }
}

/// Whether a "fresh, unseen" artifact (zero internet matches) adds deception
/// risk on its own, or only when another category is already raising risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroFootprintPolicy {
    Always,
    #[default]
    Conditional,
}

impl ZeroFootprintPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "always" => Some(Self::Always),
            "conditional" => Some(Self::Conditional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub edit_trace_risk: f64,
    pub known_editor_bonus: f64,
    /// Case-insensitive substrings; escaped and compiled into one regex by the engine.
    pub known_editors: Vec<String>,
    pub ai_floor_above: f64,
    pub deepfake_decisive_above: f64,
    pub deepfake_floor: u8,
    pub physics_floor_above: f64,
    pub physics_floor: u8,
    pub missing_camera_signature_risk: f64,
    pub zero_footprint_risk: f64,
    pub zero_footprint_policy: ZeroFootprintPolicy,
    /// Sub-signals at or below this value still count but emit no evidence line.
    pub report_above: f64,
    /// Clone probability at or below which audio counts as natural when the
    /// detector gives no explicit naturalness flag.
    pub natural_audio_clone_max: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            edit_trace_risk: 0.6,
            known_editor_bonus: 0.3,
            known_editors: [
                "photoshop",
                "lightroom",
                "gimp",
                "affinity",
                "pixelmator",
                "canva",
                "snapseed",
                "facetune",
                "faceapp",
                "after effects",
                "premiere",
                "final cut",
                "davinci resolve",
                "audacity",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            ai_floor_above: 0.5,
            deepfake_decisive_above: 0.9,
            deepfake_floor: 90,
            physics_floor_above: 0.5,
            physics_floor: 75,
            missing_camera_signature_risk: 0.7,
            zero_footprint_risk: 0.2,
            zero_footprint_policy: ZeroFootprintPolicy::Conditional,
            report_above: 0.1,
            natural_audio_clone_max: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegativeProofConfig {
    pub enabled: bool,
    pub floor: u8,
}

impl Default for NegativeProofConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            floor: 45,
        }
    }
}

// parse optional score env and clamp to <0..=100>
fn parse_floor_env(raw: Option<String>) -> Option<u8> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, 100.0) as u8)
}

impl EngineConfig {
    /// Load from the TOML file named by `VERDICT_CONFIG_PATH` (default
    /// `config/engine.toml`), apply env overrides, then validate.
    /// A missing file falls back to built-in defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let path = env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let cfg = match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|e| {
                anyhow::anyhow!("Invalid engine config at {}: {e:#}", path.display())
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(target: "verdict", path = %path.display(), "engine config not found, using defaults");
                Self::default()
            }
            Err(e) => {
                anyhow::bail!("Failed to read engine config at {}: {}", path.display(), e)
            }
        };

        cfg.with_env_overrides().validate()
    }

    /// Parse from a TOML string. Does not validate.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Apply `VERDICT_ZERO_FOOTPRINT_POLICY` / `VERDICT_NEGATIVE_PROOF_FLOOR`.
    /// Unparseable values are ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = env::var(ENV_ZERO_FOOTPRINT_POLICY) {
            match ZeroFootprintPolicy::parse(&raw) {
                Some(p) => self.signals.zero_footprint_policy = p,
                None => warn!(target: "verdict", value = %raw, "ignoring invalid {ENV_ZERO_FOOTPRINT_POLICY}"),
            }
        }
        if let Some(floor) = parse_floor_env(env::var(ENV_NEGATIVE_PROOF_FLOOR).ok()) {
            self.negative_proof.floor = floor;
        }
        self
    }

    /// Check internal consistency and re-normalize weights to sum 1.0.
    pub fn validate(mut self) -> anyhow::Result<Self> {
        let w = self.weights.as_array();
        if w.iter().any(|x| !x.is_finite() || *x < 0.0) {
            anyhow::bail!("category weights must be finite and non-negative: {:?}", w);
        }
        let sum = self.weights.sum();
        if sum <= 0.0 {
            anyhow::bail!("category weights must not all be zero");
        }
        if (sum - 1.0).abs() > 1e-9 {
            warn!(target: "verdict", sum, "category weights do not sum to 1.0, re-normalizing");
            self.weights = CategoryWeights {
                integrity: self.weights.integrity / sum,
                ai_generation: self.weights.ai_generation / sum,
                deception: self.weights.deception / sum,
                technical: self.weights.technical / sum,
            };
        }

        let l = self.levels;
        if !(l.critical_above > l.high_above && l.high_above > l.suspicious_above) {
            anyhow::bail!(
                "level thresholds must be strictly descending (critical {} > high {} > suspicious {})",
                l.critical_above,
                l.high_above,
                l.suspicious_above
            );
        }
        if l.critical_above >= 100 {
            anyhow::bail!("critical threshold {} leaves no CRITICAL band", l.critical_above);
        }

        let k = self.kill_switch;
        for (name, score) in [
            ("local_signature", k.local_signature),
            ("stock_photo", k.stock_photo),
            ("synthetic_audio", k.synthetic_audio),
            ("deepfake_floor", self.signals.deepfake_floor),
            ("physics_floor", self.signals.physics_floor),
            ("negative_proof.floor", self.negative_proof.floor),
        ] {
            if score > 100 {
                anyhow::bail!("{name} score {score} exceeds 100");
            }
        }
        if !k.legacy_cutoff_hz.is_finite() || k.legacy_cutoff_hz <= 0.0 {
            anyhow::bail!("legacy_cutoff_hz must be positive");
        }

        let s = &self.signals;
        for (name, v) in [
            ("edit_trace_risk", s.edit_trace_risk),
            ("known_editor_bonus", s.known_editor_bonus),
            ("ai_floor_above", s.ai_floor_above),
            ("deepfake_decisive_above", s.deepfake_decisive_above),
            ("physics_floor_above", s.physics_floor_above),
            ("missing_camera_signature_risk", s.missing_camera_signature_risk),
            ("zero_footprint_risk", s.zero_footprint_risk),
            ("report_above", s.report_above),
            ("natural_audio_clone_max", s.natural_audio_clone_max),
        ] {
            if !(0.0..=1.0).contains(&v) {
                anyhow::bail!("signals.{name} must be within [0, 1], got {v}");
            }
        }

        Ok(self)
    }
}
