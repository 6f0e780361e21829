//! Ticker Sentiment Service: binary entrypoint.
//! Boots the Axum HTTP server: engine wiring, routes, and `/metrics`.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ticker_sentiment_analyzer::{metrics::Metrics, router, EngineConfig, SentimentEngine};

/// Compact logs by default, JSON when `LOG_FORMAT=json`. A no-op if the
/// runtime already installed a subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ticker_sentiment_analyzer=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
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
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = EngineConfig::load_default().context("loading engine config")?;
    let metrics = Metrics::init(config.cache.ttl_secs)?;
    let engine = SentimentEngine::from_env(&config).context("building sentiment engine")?;

    tracing::info!(
        lookback_days = config.lookback_days,
        cache_ttl_secs = config.cache.ttl_secs,
        "sentiment service ready"
    );

    let app = router(Arc::new(engine)).merge(metrics.router());
    Ok(app.into())
}
