// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /analyze  (verdict envelope, scenarios, fallback-free happy path)
// - GET /analyze   (405, no verdict body)
// - POST /analyze with garbage (fallback verdict) or no body at all (405)
// - POST /debug/normalize

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use provenance_verdict::{api, AppState, VerdictEngine};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Build the same Router the binary uses, with built-in defaults.
fn test_router() -> Router {
    let engine = VerdictEngine::with_defaults().expect("default engine");
    api::router(AppState::new(engine))
}

async fn post_json(uri: &str, payload: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST");
    let resp = test_router().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

async fn analyze(payload: Json) -> Json {
    let (status, bytes) = post_json("/analyze", &payload.to_string()).await;
    assert_eq!(status, StatusCode::OK, "POST /analyze should be 200");
    serde_json::from_slice(&bytes).expect("parse analyze json")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = test_router().oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    assert_eq!(String::from_utf8(bytes).expect("utf8").trim(), "ok");
}

#[tokio::test]
async fn api_analyze_returns_expected_json_fields() {
    let v = analyze(json!({})).await;

    // Contract checks for UI consumers
    for key in [
        "score",
        "level",
        "confidence",
        "summary",
        "evidence",
        "trustFactors",
        "fingerprint",
        "timestamp",
    ] {
        assert!(v.get(key).is_some(), "missing '{key}' in {v}");
    }
    assert_eq!(v["score"], json!(45));
    assert_eq!(v["level"], json!("SUSPICIOUS"));
    assert_eq!(v["confidence"], json!("LOW"));
}

#[tokio::test]
async fn api_analyze_ai_only_is_critical() {
    let v = analyze(json!({ "forensic": { "aiArtifacts": { "confidence": 0.95 } } })).await;
    assert_eq!(v["score"], json!(95));
    assert_eq!(v["level"], json!("CRITICAL"));
    let summary = v["summary"].as_str().unwrap();
    assert!(summary.starts_with("AI generation detected"), "summary: {summary}");
}

#[tokio::test]
async fn api_analyze_stock_match_fires_kill_switch() {
    let v = analyze(json!({
        "internet": { "footprintAnalysis": { "sources": { "stockParams": true } } }
    }))
    .await;
    assert_eq!(v["score"], json!(95));
    assert_eq!(v["level"], json!("CRITICAL"));
    assert_eq!(v["confidence"], json!("HIGH"));
    assert!(v["summary"].as_str().unwrap().contains("tock-photo"));
}

#[tokio::test]
async fn api_analyze_accepts_non_object_json_as_empty_bundle() {
    let v = analyze(json!([1, 2, 3])).await;
    assert_eq!(v["score"], json!(45));
}

#[tokio::test]
async fn api_analyze_fingerprint_is_stable() {
    let a = analyze(json!({ "video": { "deepfakeConfidence": 0.3 } })).await;
    let b = analyze(json!({ "video": { "deepfakeConfidence": 0.3 } })).await;
    assert_eq!(a["fingerprint"], b["fingerprint"]);
    assert_eq!(a["score"], b["score"]);
    assert_eq!(a["evidence"], b["evidence"]);
}

#[tokio::test]
async fn api_analyze_rejects_get_with_405() {
    let req = Request::builder()
        .method("GET")
        .uri("/analyze")
        .body(Body::empty())
        .expect("build GET /analyze");

    let resp = test_router().oneshot(req).await.expect("oneshot GET /analyze");
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8_lossy(&bytes);
    assert!(!body.contains("\"score\""), "405 must not carry a verdict: {body}");
}

#[tokio::test]
async fn api_analyze_unparseable_body_fails_open_to_caution() {
    let (status, bytes) = post_json("/analyze", "this is not json").await;
    assert_eq!(status, StatusCode::OK, "garbage still gets a verdict");
    let v: Json = serde_json::from_slice(&bytes).expect("verdict json");
    assert_eq!(v["score"], json!(50));
    assert_eq!(v["level"], json!("SUSPICIOUS"));
    assert_eq!(v["confidence"], json!("UNKNOWN"));
    assert_eq!(
        v["summary"],
        json!("Automated scoring interrupted; manual review recommended.")
    );
    assert!(v.get("fingerprint").is_some());
}

#[tokio::test]
async fn api_analyze_without_body_is_method_not_allowed() {
    for payload in ["", "  \n"] {
        let (status, bytes) = post_json("/analyze", payload).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        let body = String::from_utf8_lossy(&bytes);
        assert!(!body.contains("\"score\""), "no verdict on a bodiless request: {body}");
    }
}

#[tokio::test]
async fn api_debug_normalize_echoes_canonical_evidence() {
    let (status, bytes) = post_json(
        "/debug/normalize",
        &json!({
            "audio": { "cloneProbability": 0.64 },
            "metadata": { "camera": { "make": "Unknown" }, "software": "GIMP 2.10" },
            "internet": { "footprintAnalysis": { "matchCount": 0, "isViral": true } }
        })
        .to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&bytes).expect("normalize json");
    assert_eq!(v["aiConfidence"], json!(0.64));
    assert_eq!(v["aiSource"], json!("audio"));
    assert_eq!(v["hasCameraProvenance"], json!(false));
    assert_eq!(v["softwareEditTrace"], json!("GIMP 2.10"));
    assert_eq!(v["internetMatchCount"], json!(0));
    assert_eq!(v["isViral"], json!(true));
}

#[tokio::test]
async fn api_debug_normalize_treats_garbage_as_empty_bundle() {
    let (status, bytes) = post_json("/debug/normalize", "forensic=0.9").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&bytes).expect("normalize json");
    assert_eq!(v["aiConfidence"], json!(0.0));
    assert_eq!(v["hasCameraProvenance"], json!(false));

    let (status, _) = post_json("/debug/normalize", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
