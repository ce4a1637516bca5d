//! evidence.rs — Raw detector output as it arrives over the wire.
//!
//! Each domain is kept as an untyped JSON value: upstream detectors evolve
//! independently and a shape mismatch must degrade to "absent", never to a
//! deserialization error. Typed extraction happens in `analyze::normalize`
//! through the lenient lookups below.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Combined, already-computed output of all upstream detectors for one artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forensic: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl EvidenceBundle {
    /// Total conversion: anything that is not a JSON object becomes an empty bundle.
    pub fn from_value(v: Value) -> Self {
        if !v.is_object() {
            return Self::default();
        }
        serde_json::from_value(v).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.forensic.is_none()
            && self.audio.is_none()
            && self.video.is_none()
            && self.internet.is_none()
            && self.metadata.is_none()
    }
}

fn at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |v, key| v.get(*key))
}

/// First path holding a JSON number. Strings, bools etc. count as absent.
pub(crate) fn number_at(root: Option<&Value>, paths: &[&[&str]]) -> Option<f64> {
    let root = root?;
    paths
        .iter()
        .filter_map(|p| at(root, p).and_then(Value::as_f64))
        .find(|x| x.is_finite())
}

pub(crate) fn bool_at(root: Option<&Value>, paths: &[&[&str]]) -> Option<bool> {
    let root = root?;
    paths.iter().find_map(|p| at(root, p).and_then(Value::as_bool))
}

/// First path holding a non-blank string, trimmed.
pub(crate) fn str_at<'a>(root: Option<&'a Value>, paths: &[&[&str]]) -> Option<&'a str> {
    str_where(root, paths, |_| true)
}

/// Like [`str_at`], but values rejected by `keep` fall through to the next path.
pub(crate) fn str_where<'a>(
    root: Option<&'a Value>,
    paths: &[&[&str]],
    keep: impl Fn(&str) -> bool,
) -> Option<&'a str> {
    let root = root?;
    paths
        .iter()
        .filter_map(|p| at(root, p).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty() && keep(*s))
}

/// Non-negative integral count; `3.0` is accepted, `-1` and `2.5` are not.
pub(crate) fn count_at(root: Option<&Value>, paths: &[&[&str]]) -> Option<u64> {
    let root = root?;
    paths.iter().find_map(|p| {
        let v = at(root, p)?;
        v.as_u64().or_else(|| {
            v.as_f64()
                .filter(|x| x.is_finite() && *x >= 0.0 && x.fract() == 0.0)
                .map(|x| x as u64)
        })
    })
}
