//! Verdict & explanation builder: clamps the score once, maps it to a level,
//! ranks the evidence and writes the summary and trust factors.

use super::normalize::NormalizedEvidence;
use crate::config::LevelThresholds;
use crate::decision::{Reason, ReasonKind, RiskLevel, RiskVerdict, VerdictConfidence};

pub const NO_ANOMALIES: &str = "No anomalies detected in the supplied evidence.";

/// `score` is the unclamped combiner/kill-switch score; `reasons` are in firing order.
pub fn build_verdict(
    score: i64,
    mut reasons: Vec<Reason>,
    ev: &NormalizedEvidence,
    levels: &LevelThresholds,
    confidence: VerdictConfidence,
) -> RiskVerdict {
    let score = score.clamp(0, 100) as u8;
    let level = RiskLevel::from_score(score, levels);

    // Kill-switch flags lead, then by weight; stable sort keeps firing order on ties.
    reasons.sort_by(|a, b| {
        let ka = a.kind == ReasonKind::KillSwitch;
        let kb = b.kind == ReasonKind::KillSwitch;
        kb.cmp(&ka).then(b.weight.total_cmp(&a.weight))
    });
    let evidence = reasons.into_iter().map(|r| r.message).collect::<Vec<_>>();

    let trust_factors = if level == RiskLevel::Verified {
        trust_factors(ev)
    } else {
        Vec::new()
    };

    RiskVerdict {
        score,
        level,
        confidence,
        summary: summarize(&evidence),
        evidence,
        trust_factors,
    }
}

fn summarize(evidence: &[String]) -> String {
    match evidence.split_first() {
        None => NO_ANOMALIES.to_string(),
        Some((lead, [])) => capitalize(lead),
        Some((lead, [_])) => format!("{} (+1 other anomaly)", capitalize(lead)),
        Some((lead, rest)) => format!("{} (+{} other anomalies)", capitalize(lead), rest.len()),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn trust_factors(ev: &NormalizedEvidence) -> Vec<String> {
    let mut out = Vec::new();
    if ev.has_camera_provenance {
        out.push(match &ev.camera_device {
            Some(device) => format!("camera provenance: {device}"),
            None => "camera provenance: device metadata present".to_string(),
        });
    }
    match ev.internet_match_count {
        Some(1) => out.push("external corroboration: 1 prior appearance online".to_string()),
        Some(n) if n > 1 => {
            out.push(format!("external corroboration: {n} prior appearances online"))
        }
        _ => {}
    }
    if ev.natural_audio {
        out.push("natural audio characteristics (no robotic or band-limited spectrum)".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(kind: ReasonKind, msg: &str, w: f64) -> Reason {
        Reason::new(kind, msg).weighted(w)
    }

    fn levels() -> LevelThresholds {
        LevelThresholds::default()
    }

    #[test]
    fn score_is_clamped_once() {
        let ev = NormalizedEvidence::default();
        let hi = build_verdict(140, vec![], &ev, &levels(), VerdictConfidence::Medium);
        assert_eq!(hi.score, 100);
        assert_eq!(hi.level, RiskLevel::Critical);
        let lo = build_verdict(-12, vec![], &ev, &levels(), VerdictConfidence::Medium);
        assert_eq!(lo.score, 0);
        assert_eq!(lo.level, RiskLevel::Verified);
        assert_eq!(lo.summary, NO_ANOMALIES);
    }

    #[test]
    fn evidence_is_ranked_by_weight_with_stable_ties() {
        let reasons = vec![
            r(ReasonKind::Integrity, "metadata: a", 0.135),
            r(ReasonKind::AiGeneration, "AI generation detected by x (95%)", 0.95),
            r(ReasonKind::Deception, "fresh", 0.06),
            r(ReasonKind::TechnicalAnomaly, "format b", 0.06),
        ];
        let v = build_verdict(
            95,
            reasons,
            &NormalizedEvidence::default(),
            &levels(),
            VerdictConfidence::Medium,
        );
        assert_eq!(
            v.evidence,
            vec![
                "AI generation detected by x (95%)",
                "metadata: a",
                "fresh",
                "format b"
            ]
        );
        assert_eq!(v.summary, "AI generation detected by x (95%) (+3 other anomalies)");
    }

    #[test]
    fn kill_switch_flag_always_leads() {
        let reasons = vec![
            r(ReasonKind::AiGeneration, "heavier", 1.0),
            r(ReasonKind::KillSwitch, "stock-photo context mismatch", 0.1),
        ];
        let v = build_verdict(
            95,
            reasons,
            &NormalizedEvidence::default(),
            &levels(),
            VerdictConfidence::High,
        );
        assert_eq!(v.evidence[0], "stock-photo context mismatch");
        assert_eq!(v.summary, "Stock-photo context mismatch (+1 other anomaly)");
    }

    #[test]
    fn trust_factors_only_when_verified() {
        let ev = NormalizedEvidence {
            has_camera_provenance: true,
            camera_device: Some("Canon EOS R5".into()),
            internet_match_count: Some(12),
            natural_audio: true,
            ..Default::default()
        };
        let v = build_verdict(10, vec![], &ev, &levels(), VerdictConfidence::Medium);
        assert_eq!(
            v.trust_factors,
            vec![
                "camera provenance: Canon EOS R5".to_string(),
                "external corroboration: 12 prior appearances online".to_string(),
                "natural audio characteristics (no robotic or band-limited spectrum)".to_string(),
            ]
        );

        let v = build_verdict(31, vec![], &ev, &levels(), VerdictConfidence::Medium);
        assert!(v.trust_factors.is_empty());
    }

    #[test]
    fn single_appearance_wording() {
        let ev = NormalizedEvidence {
            internet_match_count: Some(1),
            ..Default::default()
        };
        let v = build_verdict(0, vec![], &ev, &levels(), VerdictConfidence::Medium);
        assert_eq!(
            v.trust_factors,
            vec!["external corroboration: 1 prior appearance online".to_string()]
        );
    }
}
