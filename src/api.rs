use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analyze::AggregationResult;
use crate::engine::SentimentEngine;
use crate::error::EngineError;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<SentimentEngine>,
}

pub fn router(engine: Arc<SentimentEngine>) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/sentiment", get(sentiment))
        .route("/debug/source-weight", get(debug_source_weight))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct SentimentQuery {
    ticker: String,
    #[serde(default)]
    days: Option<u32>,
}

/// `EngineError` as a 400 with a JSON body.
pub struct ApiError(EngineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.0.to_string() });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

async fn sentiment(
    State(state): State<AppState>,
    Query(q): Query<SentimentQuery>,
) -> Result<Json<Arc<AggregationResult>>, ApiError> {
    let days = q.days.unwrap_or_else(|| state.engine.default_lookback());
    match state.engine.analyze(&q.ticker, days).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::info!(target: "engine", ticker = %q.ticker, days, error = %e, "rejected query");
            Err(ApiError(e))
        }
    }
}

async fn debug_source_weight(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> String {
    let s = q.get("source").cloned().unwrap_or_default();
    let w = state.engine.weights().weight_for(&s);
    format!("source='{}' -> weight={:.2}", s, w)
}
