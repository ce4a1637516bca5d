//! # Verdict Engine
//! Pure, testable pipeline that maps `EvidenceBundle` → `RiskVerdict`.
//! No I/O and no state across calls; the configuration is fixed at construction.
//!
//! Policy: a kill switch fixes the verdict outright; otherwise category risks
//! are blended by weight, floored by single strong signals and by the
//! negative-proof rule, then thresholded into a level.

use std::sync::Arc;

use tracing::{debug, info};

use crate::analyze::{self, kill_switch, RiskCombiner};
use crate::config::EngineConfig;
use crate::decision::{Reason, ReasonKind, RiskVerdict, VerdictConfidence};
use crate::evidence::EvidenceBundle;

/// Outcome of one evaluation plus which path produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub verdict: RiskVerdict,
    pub kill_switch: Option<kill_switch::KillSwitchRule>,
    pub negative_proof: bool,
}

#[derive(Debug, Clone)]
pub struct VerdictEngine {
    config: Arc<EngineConfig>,
    combiner: RiskCombiner,
}

impl VerdictEngine {
    /// Expects a validated config (see [`EngineConfig::validate`]).
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let combiner = RiskCombiner::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            combiner,
        })
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalize(&self, bundle: &EvidenceBundle) -> analyze::NormalizedEvidence {
        analyze::normalize(bundle, &self.config)
    }

    pub fn evaluate(&self, bundle: &EvidenceBundle) -> anyhow::Result<RiskVerdict> {
        Ok(self.evaluate_detailed(bundle)?.verdict)
    }

    pub fn evaluate_detailed(&self, bundle: &EvidenceBundle) -> anyhow::Result<Evaluation> {
        let ev = self.normalize(bundle);

        let ks = kill_switch::evaluate(&ev, &self.config.kill_switch);
        if ks.fired {
            info!(target: "verdict", rule = ?ks.rule, score = ks.score, "kill switch fired");
            let reasons = ks
                .flags
                .into_iter()
                .map(|f| Reason::new(ReasonKind::KillSwitch, f).weighted(1.0))
                .collect();
            let verdict = analyze::build_verdict(
                i64::from(ks.score),
                reasons,
                &ev,
                &self.config.levels,
                VerdictConfidence::High,
            );
            return Ok(Evaluation {
                verdict,
                kill_switch: ks.rule,
                negative_proof: false,
            });
        }

        let combined = self.combiner.combine(&ev)?;
        let confidence = if combined.negative_proof {
            VerdictConfidence::Low
        } else {
            VerdictConfidence::Medium
        };
        let verdict = analyze::build_verdict(
            combined.score,
            combined.reasons,
            &ev,
            &self.config.levels,
            confidence,
        );
        debug!(
            target: "verdict",
            score = verdict.score,
            level = verdict.level.as_str(),
            evidence = verdict.evidence.len(),
            "verdict built"
        );

        Ok(Evaluation {
            verdict,
            kill_switch: None,
            negative_proof: combined.negative_proof,
        })
    }
}
