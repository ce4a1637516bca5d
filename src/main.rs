//! Shuttle entrypoint for the verdict service: loads the engine config,
//! installs the Prometheus recorder and serves the API plus `/metrics`.

use provenance_verdict::{api, telemetry::Metrics, AppState};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter: engine decisions at debug, everything else only when it warns.
const DEV_LOG_FILTER: &str = "verdict=debug,warn";

/// Local runs opt in with `VERDICT_DEV_LOG=1`. Release builds also need
/// `SHUTTLE_ENV` to name a dev environment, so deployed services keep
/// Shuttle's own subscriber.
fn dev_logging_requested() -> bool {
    if std::env::var("VERDICT_DEV_LOG").as_deref() != Ok("1") {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    std::env::var("SHUTTLE_ENV").is_ok_and(|env| {
        ["local", "development", "dev"]
            .iter()
            .any(|dev| env.eq_ignore_ascii_case(dev))
    })
}

fn init_dev_tracing() {
    if !dev_logging_requested() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEV_LOG_FILTER));
    // try_init: a subscriber installed by the runtime wins.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // .env may set VERDICT_CONFIG_PATH and the engine overrides; absent in prod.
    let _ = dotenvy::dotenv();

    init_dev_tracing();

    let state = AppState::from_env()?;
    let metrics = Metrics::init(state.engine().config())?;

    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
