//! Input normalizer: maps whatever the detectors sent into a fixed-shape
//! `NormalizedEvidence`. Total function; missing or mistyped data falls back
//! to defaults (0 / false / None).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::decision::clamp01;
use crate::evidence::{bool_at, count_at, number_at, str_at, str_where, EvidenceBundle};

/// Camera fields that carry no provenance.
static CAMERA_SENTINEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(unknown|n/?a|none|null|-)$").expect("camera sentinel regex"));

/// Which detector supplied the rolled-up `ai_confidence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiSource {
    Visual,
    Audio,
    Video,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvidence {
    pub ai_confidence: f64,
    pub ai_source: Option<AiSource>,
    pub ai_model: Option<String>,
    pub format_risk: f64,
    pub physics_risk: f64,
    pub local_signature_hit: bool,
    pub generator_signature: Option<String>,
    pub deepfake_confidence: f64,
    pub voice_clone_confidence: f64,
    pub synthetic_spectrum: bool,
    pub natural_audio: bool,
    pub is_stock_photo_match: bool,
    /// `None` means the footprint search did not run.
    pub internet_match_count: Option<u64>,
    pub is_viral: bool,
    pub has_camera_provenance: bool,
    pub camera_device: Option<String>,
    pub software_edit_trace: Option<String>,
}

impl NormalizedEvidence {
    /// No external source has seen this media (count is zero or unknown).
    pub fn lacks_corroboration(&self) -> bool {
        matches!(self.internet_match_count, None | Some(0))
    }
}

// Forensic paths accept both the flat and the `details.`-nested layout.
const AI_CONFIDENCE: &[&[&str]] = &[
    &["aiArtifacts", "confidence"],
    &["details", "aiArtifacts", "confidence"],
];
const AI_MODEL: &[&[&str]] = &[
    &["aiArtifacts", "model_flagged"],
    &["aiArtifacts", "modelFlagged"],
    &["details", "aiArtifacts", "model_flagged"],
    &["details", "aiArtifacts", "modelFlagged"],
];
const PHYSICS: &[&[&str]] = &[
    &["aiArtifacts", "physics_score"],
    &["aiArtifacts", "physicsScore"],
    &["details", "aiArtifacts", "physics_score"],
    &["details", "aiArtifacts", "physicsScore"],
];
const FORMAT_RISK: &[&[&str]] = &[
    &["formatAnalysis", "risk"],
    &["details", "formatAnalysis", "risk"],
];
const MISSING_CAMERA_SIG: &[&[&str]] = &[
    &["formatAnalysis", "missingCameraSignature"],
    &["details", "formatAnalysis", "missingCameraSignature"],
];
const SIGNATURE_DETECTED: &[&[&str]] = &[
    &["localSignature", "detected"],
    &["details", "localSignature", "detected"],
];
const SIGNATURE_GENERATOR: &[&[&str]] = &[
    &["localSignature", "generator"],
    &["details", "localSignature", "generator"],
];

const CLONE_PROBABILITY: &[&[&str]] = &[
    &["cloneProbability"],
    &["cloning_probability"],
    &["voiceAnalysis", "cloneProbability"],
];
const HARD_CUTOFF: &[&[&str]] = &[&["spectral", "hardCutoff"]];
const CUTOFF_HZ: &[&[&str]] = &[&["spectral", "cutoffHz"]];
const NATURAL_SIGNAL: &[&[&str]] = &[&["naturalSignal"], &["spectral", "natural"]];

const DEEPFAKE: &[&[&str]] = &[
    &["deepfake", "confidence"],
    &["deepfakeConfidence"],
    &["deepfake_confidence"],
];

const STOCK_MATCH: &[&[&str]] = &[&["footprintAnalysis", "sources", "stockParams"]];
const MATCH_COUNT: &[&[&str]] = &[
    &["footprintAnalysis", "matchCount"],
    &["footprintAnalysis", "totalMatches"],
    &["matchCount"],
];
const VIRAL: &[&[&str]] = &[&["footprintAnalysis", "isViral"], &["isViral"]];

const CAMERA_MAKE: &[&[&str]] = &[&["camera", "make"], &["make"]];
const CAMERA_MODEL: &[&[&str]] = &[&["camera", "model"], &["model"], &["device"]];
const SOFTWARE: &[&[&str]] = &[&["software"], &["editing", "software"]];

pub fn normalize(bundle: &EvidenceBundle, cfg: &EngineConfig) -> NormalizedEvidence {
    let forensic = bundle.forensic.as_ref();
    let audio = bundle.audio.as_ref();
    let video = bundle.video.as_ref();
    let internet = bundle.internet.as_ref();
    let metadata = bundle.metadata.as_ref();

    let mut ev = NormalizedEvidence::default();

    // --- forensic ---
    let model = str_at(forensic, AI_MODEL);
    let model_declined = model.is_some_and(|m| m.eq_ignore_ascii_case("none"));
    let visual = if model_declined {
        0.0
    } else {
        number_at(forensic, AI_CONFIDENCE).map(clamp01).unwrap_or(0.0)
    };
    ev.ai_model = model.filter(|_| !model_declined).map(str::to_string);

    ev.physics_risk = number_at(forensic, PHYSICS).map(clamp01).unwrap_or(0.0);
    ev.format_risk = number_at(forensic, FORMAT_RISK).map(clamp01).unwrap_or(0.0);
    if bool_at(forensic, MISSING_CAMERA_SIG) == Some(true) {
        ev.format_risk = ev
            .format_risk
            .max(cfg.signals.missing_camera_signature_risk);
    }
    ev.local_signature_hit = bool_at(forensic, SIGNATURE_DETECTED).unwrap_or(false);
    ev.generator_signature = str_at(forensic, SIGNATURE_GENERATOR)
        .filter(|_| ev.local_signature_hit)
        .map(str::to_string);

    // --- audio ---
    let clone = number_at(audio, CLONE_PROBABILITY).map(clamp01);
    ev.voice_clone_confidence = clone.unwrap_or(0.0);
    let cutoff_in_legacy_band = number_at(audio, CUTOFF_HZ)
        .map(|hz| hz <= cfg.kill_switch.legacy_cutoff_hz)
        .unwrap_or(true);
    ev.synthetic_spectrum = bool_at(audio, HARD_CUTOFF) == Some(true) && cutoff_in_legacy_band;
    ev.natural_audio = match bool_at(audio, NATURAL_SIGNAL) {
        Some(flag) => flag && !ev.synthetic_spectrum,
        None => clone.is_some_and(|c| c <= cfg.signals.natural_audio_clone_max)
            && !ev.synthetic_spectrum,
    };

    // --- video ---
    ev.deepfake_confidence = number_at(video, DEEPFAKE).map(clamp01).unwrap_or(0.0);

    // Roll-up: highest AI/synthetic confidence; earlier source wins ties.
    for (src, conf) in [
        (AiSource::Visual, visual),
        (AiSource::Audio, ev.voice_clone_confidence),
        (AiSource::Video, ev.deepfake_confidence),
    ] {
        if conf > ev.ai_confidence {
            ev.ai_confidence = conf;
            ev.ai_source = Some(src);
        }
    }

    // --- internet ---
    ev.is_stock_photo_match = bool_at(internet, STOCK_MATCH).unwrap_or(false);
    ev.internet_match_count = count_at(internet, MATCH_COUNT);
    ev.is_viral = bool_at(internet, VIRAL).unwrap_or(false);

    // --- metadata ---
    let real_device = |s: &str| !CAMERA_SENTINEL.is_match(s);
    let device = [
        str_where(metadata, CAMERA_MAKE, real_device),
        str_where(metadata, CAMERA_MODEL, real_device),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();
    ev.has_camera_provenance = !device.is_empty();
    ev.camera_device = (!device.is_empty()).then(|| device.join(" "));
    ev.software_edit_trace = str_at(metadata, SOFTWARE).map(str::to_string);

    ev
}
