//! Kill switches: near-certain deception/generation signals that fix the
//! verdict and bypass the weighted combiner.
//!
//! This is a decision list, not a union. Rules run in priority order and the
//! first match wins; later rules are never evaluated.

use serde::Serialize;

use super::normalize::NormalizedEvidence;
use crate::config::KillSwitchConfig;

pub const FLAG_LOCAL_SIGNATURE: &str = "known generator signature in file header";
pub const FLAG_STOCK_PHOTO: &str = "stock-photo context mismatch";
pub const FLAG_SYNTHETIC_AUDIO: &str = "synthetic audio spectrum";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KillSwitchRule {
    LocalSignature,
    StockPhoto,
    SyntheticAudio,
}

impl KillSwitchRule {
    /// Priority order.
    pub const ALL: [KillSwitchRule; 3] = [
        KillSwitchRule::LocalSignature,
        KillSwitchRule::StockPhoto,
        KillSwitchRule::SyntheticAudio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalSignature => "local_signature",
            Self::StockPhoto => "stock_photo",
            Self::SyntheticAudio => "synthetic_audio",
        }
    }

    fn matches(&self, ev: &NormalizedEvidence) -> bool {
        match self {
            Self::LocalSignature => ev.local_signature_hit,
            Self::StockPhoto => ev.is_stock_photo_match,
            Self::SyntheticAudio => ev.synthetic_spectrum,
        }
    }

    fn score(&self, cfg: &KillSwitchConfig) -> u8 {
        match self {
            Self::LocalSignature => cfg.local_signature,
            Self::StockPhoto => cfg.stock_photo,
            Self::SyntheticAudio => cfg.synthetic_audio,
        }
    }

    fn flag(&self, ev: &NormalizedEvidence) -> String {
        match self {
            Self::LocalSignature => match &ev.generator_signature {
                Some(name) => format!("{FLAG_LOCAL_SIGNATURE} ({name})"),
                None => FLAG_LOCAL_SIGNATURE.to_string(),
            },
            Self::StockPhoto => FLAG_STOCK_PHOTO.to_string(),
            Self::SyntheticAudio => FLAG_SYNTHETIC_AUDIO.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KillSwitchOutcome {
    pub fired: bool,
    pub score: u8,
    pub flags: Vec<String>,
    pub rule: Option<KillSwitchRule>,
}

impl KillSwitchOutcome {
    fn quiet() -> Self {
        Self {
            fired: false,
            score: 0,
            flags: Vec::new(),
            rule: None,
        }
    }
}

pub fn evaluate(ev: &NormalizedEvidence, cfg: &KillSwitchConfig) -> KillSwitchOutcome {
    KillSwitchRule::ALL
        .iter()
        .find(|rule| rule.matches(ev))
        .map(|rule| KillSwitchOutcome {
            fired: true,
            score: rule.score(cfg),
            flags: vec![rule.flag(ev)],
            rule: Some(*rule),
        })
        .unwrap_or_else(KillSwitchOutcome::quiet)
}
