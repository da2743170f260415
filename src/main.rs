//! BioCosmos API — Binary Entrypoint
//! Loads configuration and the publication table, builds the advisory service
//! once, and serves it through the Axum router.

use biocosmos::config::EngineConfig;
use biocosmos::metrics::Metrics;
use biocosmos::{api, AdvisoryService, AppState};
use shuttle_axum::ShuttleAxum;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Structured logs; `LOG_FORMAT=json` switches to JSON lines.
/// Filter comes from `RUST_LOG`, defaulting to the engine's own targets.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("advisor=info,ingest=info,generate=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // The runtime may already have installed a subscriber; keep it if so.
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = EngineConfig::load_default()?;
    let service = AdvisoryService::from_config(&cfg);

    let mut router = api::router(AppState::new(service));
    match Metrics::init(cfg.limits) {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => warn!(error = ?e, "prometheus recorder not installed; /metrics disabled"),
    }

    Ok(router.into())
}
