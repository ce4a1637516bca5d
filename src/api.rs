use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use anyhow::Context as _;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::decision::RiskVerdict;
use crate::engine::{Evaluation, VerdictEngine};
use crate::evidence::EvidenceBundle;

/// Shared app state. The engine snapshot is swapped whole on config reload;
/// each request evaluates against one immutable snapshot.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<RwLock<Arc<VerdictEngine>>>,
}

impl AppState {
    pub fn new(engine: VerdictEngine) -> Self {
        Self {
            engine: Arc::new(RwLock::new(Arc::new(engine))),
        }
    }

    /// Engine from `EngineConfig::from_env()` (config file + env overrides).
    pub fn from_env() -> anyhow::Result<Self> {
        let cfg = EngineConfig::from_env()?;
        Ok(Self::new(VerdictEngine::new(cfg)?))
    }

    pub fn engine(&self) -> Arc<VerdictEngine> {
        match self.engine.read() {
            Ok(g) => Arc::clone(&g),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn replace_engine(&self, engine: VerdictEngine) {
        let fresh = Arc::new(engine);
        match self.engine.write() {
            Ok(mut g) => *g = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", post(analyze))
        .route("/debug/normalize", post(debug_normalize))
        .route("/admin/reload-config", post(admin_reload_config))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerdictResponse {
    #[serde(flatten)]
    verdict: RiskVerdict,
    fingerprint: String,
    timestamp: String,
}

async fn analyze(State(state): State<AppState>, body: Bytes) -> Response {
    if is_blank(&body) {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let fingerprint = anon_hash(&body);
    let engine = state.engine();

    // Unparseable JSON is a scoring fault like any other: fallback verdict, still 200.
    let verdict = guarded_verdict(&fingerprint, || {
        let raw: Value =
            serde_json::from_slice(&body).context("request body is not valid JSON")?;
        let bundle = EvidenceBundle::from_value(raw);
        if bundle.is_empty() {
            debug!(target: "verdict", %fingerprint, "no detector domains in bundle");
        }
        engine.evaluate_detailed(&bundle)
    });
    info!(
        target: "verdict",
        %fingerprint,
        score = verdict.score,
        level = verdict.level.as_str(),
        "analyze"
    );

    Json(VerdictResponse {
        verdict,
        fingerprint,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
    .into_response()
}

/// Fail open to caution: any error or panic while scoring becomes the
/// documented fallback verdict instead of a transport-level failure.
pub fn guarded_verdict<F>(fingerprint: &str, f: F) -> RiskVerdict
where
    F: FnOnce() -> anyhow::Result<Evaluation>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(eval)) => {
            counter!("verdicts_total", "level" => eval.verdict.level.as_str()).increment(1);
            if let Some(rule) = eval.kill_switch {
                counter!("kill_switch_total", "rule" => rule.as_str()).increment(1);
            }
            eval.verdict
        }
        Ok(Err(e)) => {
            warn!(target: "verdict", %fingerprint, error = %format!("{e:#}"), "scoring failed, returning fallback verdict");
            counter!("verdict_fallback_total").increment(1);
            RiskVerdict::fallback()
        }
        Err(_) => {
            warn!(target: "verdict", %fingerprint, "scoring panicked, returning fallback verdict");
            counter!("verdict_fallback_total").increment(1);
            RiskVerdict::fallback()
        }
    }
}

async fn debug_normalize(State(state): State<AppState>, body: Bytes) -> Response {
    if is_blank(&body) {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    // Same leniency as /analyze: unparseable input normalizes like an empty bundle.
    let raw = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    let ev = state.engine().normalize(&EvidenceBundle::from_value(raw));
    Json(ev).into_response()
}

async fn admin_reload_config(State(state): State<AppState>) -> String {
    match EngineConfig::from_env().and_then(VerdictEngine::new) {
        Ok(engine) => {
            state.replace_engine(engine);
            info!(target: "verdict", "engine config reloaded");
            "reloaded".to_string()
        }
        Err(e) => {
            warn!(target: "verdict", error = %format!("{e:#}"), "config reload failed, keeping previous engine");
            format!("failed: {e:#}")
        }
    }
}

/// No body at all is a malformed request, not evidence.
fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

/// Log correlation id for a request body: first 6 bytes of its SHA-256, hex.
/// Evidence itself never reaches the logs.
pub(crate) fn anon_hash(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    Sha256::digest(bytes)[..6]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
