//! Thin HTTP adapter: parses parameters, calls the service, renders results.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::EngineError;
use crate::publication::{Publication, TopicCount};
use crate::rate_limit::RateUsage;
use crate::search::DEFAULT_LIMIT;
use crate::service::{AdvisoryAnswer, AdvisoryService};

/// Results fed to the chat answer when the caller does not say otherwise.
pub const DEFAULT_CHAT_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AdvisoryService>,
}

impl AppState {
    pub fn new(service: AdvisoryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/summaries", get(summaries))
        .route("/api/topics", get(topics))
        .route("/api/chat", post(chat))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Engine error rendered as `{"error": .., "kind": ..}` with a matching status.
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct HealthOut {
    status: &'static str,
    service: &'static str,
    publications: usize,
    rate: RateUsage,
}

async fn health(State(state): State<AppState>) -> Json<HealthOut> {
    Json(HealthOut {
        status: "healthy",
        service: "BioCosmos Dashboard API",
        publications: state.service.index().len(),
        rate: state.service.rate_usage(),
    })
}

#[derive(Deserialize)]
struct SummariesParams {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

async fn summaries(
    State(state): State<AppState>,
    Query(q): Query<SummariesParams>,
) -> Result<Json<Vec<Publication>>, ApiError> {
    let hits = state.service.search(
        q.query.as_deref().unwrap_or_default(),
        q.topic.as_deref(),
        q.limit.unwrap_or(DEFAULT_LIMIT),
    )?;
    Ok(Json(hits))
}

async fn topics(State(state): State<AppState>) -> Json<Vec<TopicCount>> {
    Json(state.service.topic_distribution())
}

#[derive(Deserialize)]
struct ChatReq {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatReq>,
) -> Result<Json<AdvisoryAnswer>, ApiError> {
    let out = state
        .service
        .answer(&body.query, body.limit.unwrap_or(DEFAULT_CHAT_LIMIT))
        .await?;
    Ok(Json(out))
}
