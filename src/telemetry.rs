use axum::{extract::State, routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::EngineConfig;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process (the binary does);
    /// without it the `counter!` calls in `api` are no-ops.
    pub fn init(cfg: &EngineConfig) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        // Lets dashboards tell a floored verdict from an organic 45.
        gauge!("verdict_negative_proof_floor").set(f64::from(cfg.negative_proof.floor));

        Ok(Self { handle })
    }

    /// `/metrics` in Prometheus text format; merged into the app router by the binary.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(render))
            .with_state(self.handle.clone())
    }
}

async fn render(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
