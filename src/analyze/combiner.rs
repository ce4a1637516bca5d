//! Weighted risk combiner. Only runs when no kill switch fired.
//!
//! Four category risks in [0,1] are blended with the configured weights:
//!
//! score = round(100 * (w_integrity*integrity + w_ai*ai + w_deception*deception + w_technical*technical))
//!
//! Single strong detector verdicts then impose floors via `max` (AI > 0.5,
//! deepfake > 0.9, physics > 0.5), and the negative-proof rule floors media
//! with no verifiable origin at all. Every step is a `max` over non-decreasing
//! terms, so the score is monotone in each risk input.

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::normalize::{AiSource, NormalizedEvidence};
use crate::config::{
    CategoryWeights, EngineConfig, NegativeProofConfig, SignalConfig, ZeroFootprintPolicy,
};
use crate::decision::{pct, Reason, ReasonKind};

pub const NEGATIVE_PROOF_RATIONALE: &str =
    "unverified source: absent both camera provenance and any external corroboration";
pub const FRESH_MEDIA: &str = "fresh media: no prior internet footprint";

/// Per-category risks in [0,1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryRisks {
    pub integrity: f64,
    pub ai_generation: f64,
    pub deception: f64,
    pub technical: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRisk {
    /// Rounded but not yet clamped.
    pub score: i64,
    pub categories: CategoryRisks,
    /// In firing order; ranking happens in `explain`.
    pub reasons: Vec<Reason>,
    pub negative_proof: bool,
}

#[derive(Debug, Clone)]
pub struct RiskCombiner {
    weights: CategoryWeights,
    signals: SignalConfig,
    negative_proof: NegativeProofConfig,
    editors: Option<Regex>,
}

impl RiskCombiner {
    pub fn new(cfg: &EngineConfig) -> anyhow::Result<Self> {
        Ok(Self {
            weights: cfg.weights,
            signals: cfg.signals.clone(),
            negative_proof: cfg.negative_proof,
            editors: compile_editors(&cfg.signals.known_editors)?,
        })
    }

    fn is_known_editor(&self, software: &str) -> bool {
        self.editors.as_ref().is_some_and(|re| re.is_match(software))
    }

    pub fn combine(&self, ev: &NormalizedEvidence) -> anyhow::Result<CombinedRisk> {
        let s = &self.signals;
        let w = &self.weights;
        let mut reasons = Vec::new();
        // Score floors in score units (0..=100).
        let mut floor: f64 = 0.0;

        // 1) Integrity
        let mut integrity = 0.0;
        if let Some(software) = &ev.software_edit_trace {
            integrity += s.edit_trace_risk;
            let known = self.is_known_editor(software);
            if known {
                integrity += s.known_editor_bonus;
            }
            integrity = f64::min(integrity, 1.0);
            if integrity > s.report_above {
                let msg = if known {
                    format!("metadata: edited with {software} (known editing tool)")
                } else {
                    format!("metadata: software trace \"{software}\"")
                };
                reasons.push(
                    Reason::new(ReasonKind::Integrity, msg).weighted(integrity * w.integrity),
                );
            }
        }

        // 2) AI generation
        let ai = ev.ai_confidence;
        let deepfake_decisive = ev.deepfake_confidence > s.deepfake_decisive_above;
        if ai > s.ai_floor_above {
            floor = floor.max(ai * 100.0);
        }
        let lead_is_video = ev.ai_source == Some(AiSource::Video);
        if ai > s.report_above && !(deepfake_decisive && lead_is_video) {
            let by = match ev.ai_source {
                Some(AiSource::Visual) => ev
                    .ai_model
                    .as_deref()
                    .map(|m| format!("visual model {m}"))
                    .unwrap_or_else(|| "visual model".to_string()),
                Some(AiSource::Audio) => "voice-clone analysis".to_string(),
                Some(AiSource::Video) => "video deepfake analysis".to_string(),
                None => "detector".to_string(),
            };
            let reason = if ai > s.ai_floor_above {
                Reason::new(
                    ReasonKind::AiGeneration,
                    format!("AI generation detected by {by} ({}%)", pct(ai)),
                )
                .weighted(ai)
            } else {
                Reason::new(
                    ReasonKind::AiGeneration,
                    format!("weak AI-generation signal from {by} ({}%)", pct(ai)),
                )
                .weighted(ai * w.ai_generation)
            };
            reasons.push(reason);
        }
        // Secondary detectors that did not lead the roll-up.
        if ev.ai_source != Some(AiSource::Audio) && ev.voice_clone_confidence > s.report_above {
            reasons.push(
                Reason::new(
                    ReasonKind::AiGeneration,
                    format!(
                        "voice-clone probability ({}%)",
                        pct(ev.voice_clone_confidence)
                    ),
                )
                .weighted(ev.voice_clone_confidence * w.ai_generation),
            );
        }
        if deepfake_decisive {
            floor = floor.max(f64::from(s.deepfake_floor));
            reasons.push(
                Reason::new(
                    ReasonKind::AiGeneration,
                    format!(
                        "video deepfake: face manipulation conclusive ({}%)",
                        pct(ev.deepfake_confidence)
                    ),
                )
                .weighted(ev.deepfake_confidence),
            );
        } else if !lead_is_video && ev.deepfake_confidence > s.report_above {
            reasons.push(
                Reason::new(
                    ReasonKind::AiGeneration,
                    format!(
                        "video face-manipulation confidence ({}%)",
                        pct(ev.deepfake_confidence)
                    ),
                )
                .weighted(ev.deepfake_confidence * w.ai_generation),
            );
        }

        // 4) Technical anomaly (needed before deception for the conditional policy)
        let technical = ev.format_risk.max(ev.physics_risk);
        let mut technical_reasons = Vec::new();
        if ev.format_risk > s.report_above {
            technical_reasons.push(
                Reason::new(
                    ReasonKind::TechnicalAnomaly,
                    format!("format anomaly: structural risk ({}%)", pct(ev.format_risk)),
                )
                .weighted(ev.format_risk * w.technical),
            );
        }
        if ev.physics_risk > s.physics_floor_above {
            floor = floor.max(f64::from(s.physics_floor));
            technical_reasons.push(
                Reason::new(
                    ReasonKind::TechnicalAnomaly,
                    format!(
                        "synthetic physics: entropy/variance mismatch ({}%)",
                        pct(ev.physics_risk)
                    ),
                )
                .weighted(f64::from(s.physics_floor) / 100.0),
            );
        } else if ev.physics_risk > s.report_above {
            technical_reasons.push(
                Reason::new(
                    ReasonKind::TechnicalAnomaly,
                    format!(
                        "physics irregularity: unnatural smoothness ({}%)",
                        pct(ev.physics_risk)
                    ),
                )
                .weighted(ev.physics_risk * w.technical),
            );
        }

        // 3) Deception (OSINT)
        let other_risk = integrity > 0.0 || ai > 0.0 || technical > 0.0;
        let deception = if ev.is_stock_photo_match {
            reasons.push(
                Reason::new(ReasonKind::Deception, super::kill_switch::FLAG_STOCK_PHOTO)
                    .weighted(w.deception),
            );
            1.0
        } else if ev.internet_match_count == Some(0)
            && (s.zero_footprint_policy == ZeroFootprintPolicy::Always || other_risk)
        {
            if s.zero_footprint_risk > s.report_above {
                reasons.push(
                    Reason::new(ReasonKind::Deception, FRESH_MEDIA)
                        .weighted(s.zero_footprint_risk * w.deception),
                );
            }
            s.zero_footprint_risk
        } else {
            0.0
        };
        reasons.extend(technical_reasons);

        let categories = CategoryRisks {
            integrity,
            ai_generation: ai,
            deception,
            technical,
        };
        let weighted = 100.0
            * (integrity * w.integrity
                + ai * w.ai_generation
                + deception * w.deception
                + technical * w.technical);
        if !weighted.is_finite() || !floor.is_finite() {
            anyhow::bail!("non-finite risk score (weighted {weighted}, floor {floor})");
        }
        let mut score = round_score(weighted).max(round_score(floor)) as i64;

        // Negative proof: no camera provenance and nobody else has seen it.
        let np = &self.negative_proof;
        let mut negative_proof = false;
        if np.enabled
            && !ev.has_camera_provenance
            && ev.lacks_corroboration()
            && score < i64::from(np.floor)
        {
            score = i64::from(np.floor);
            negative_proof = true;
            reasons.push(
                Reason::new(ReasonKind::Provenance, NEGATIVE_PROOF_RATIONALE)
                    .weighted(f64::from(np.floor) / 100.0),
            );
        }

        debug!(
            target: "verdict",
            integrity, ai, deception, technical, weighted, floor, score, negative_proof,
            "weighted combination"
        );

        Ok(CombinedRisk {
            score,
            categories,
            reasons,
            negative_proof,
        })
    }
}

/// Half-up rounding that absorbs float noise (13.4999999999 from 0.9 * 0.15).
fn round_score(x: f64) -> f64 {
    (x + 1e-9).round()
}

/// One case-insensitive alternation over the escaped editor names.
fn compile_editors(names: &[String]) -> anyhow::Result<Option<Regex>> {
    let alts = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>();
    if alts.is_empty() {
        return Ok(None);
    }
    let pattern = format!("(?i)(?:{})", alts.join("|"));
    let re = Regex::new(&pattern)
        .map_err(|e| anyhow::anyhow!("known_editors pattern error: {}", e))?;
    Ok(Some(re))
}
