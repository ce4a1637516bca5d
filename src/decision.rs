//! decision.rs — Verdict structures: risk level, explainability reasons and the
//! final `RiskVerdict` returned to callers.
//!
//! Note: the verdict carries no timestamp. Anything time-dependent lives in the
//! HTTP envelope so that identical bundles yield identical verdicts.

use serde::{Deserialize, Serialize};

use crate::config::LevelThresholds;

pub const FALLBACK_SCORE: u8 = 50;
pub const FALLBACK_SUMMARY: &str = "Automated scoring interrupted; manual review recommended.";

/// Risk band derived solely from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Verified,
    Suspicious,
    High,
    Critical,
}

impl RiskLevel {
    /// Exclusive lower bounds per the threshold table.
    pub fn from_score(score: u8, t: &LevelThresholds) -> Self {
        if score > t.critical_above {
            Self::Critical
        } else if score > t.high_above {
            Self::High
        } else if score > t.suspicious_above {
            Self::Suspicious
        } else {
            Self::Verified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::Suspicious => "SUSPICIOUS",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// How the verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictConfidence {
    /// A kill switch fixed the verdict.
    High,
    /// Weighted combination of category risks.
    Medium,
    /// The negative-proof floor governs the score.
    Low,
    /// Scoring was interrupted; fallback verdict.
    Unknown,
}

/// Coarse reason categories, kept for ranking and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    KillSwitch,
    Integrity,
    AiGeneration,
    Deception,
    TechnicalAnomaly,
    Provenance,
}

/// One explainability line with the share of the score it accounts for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub message: String,
    /// Contribution to the final score in <0.0, 1.0>; used for ranking.
    pub weight: f64,
    pub kind: ReasonKind,
}

impl Reason {
    pub fn new(kind: ReasonKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            weight: 0.0,
            kind,
        }
    }

    pub fn weighted(mut self, w: f64) -> Self {
        self.weight = clamp01(w);
        self
    }
}

/// Final verdict. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskVerdict {
    pub score: u8,
    pub level: RiskLevel,
    pub confidence: VerdictConfidence,
    pub summary: String,
    pub evidence: Vec<String>,
    pub trust_factors: Vec<String>,
}

impl RiskVerdict {
    /// Degraded verdict used when scoring faults: fail open to caution.
    pub fn fallback() -> Self {
        Self {
            score: FALLBACK_SCORE,
            level: RiskLevel::Suspicious,
            confidence: VerdictConfidence::Unknown,
            summary: FALLBACK_SUMMARY.to_string(),
            evidence: Vec::new(),
            trust_factors: Vec::new(),
        }
    }
}

pub(crate) fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Percentage of a [0,1] value, rounded.
pub(crate) fn pct(x: f64) -> i64 {
    (clamp01(x) * 100.0).round() as i64
}
