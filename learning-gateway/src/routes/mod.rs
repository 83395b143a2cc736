//! HTTP routes
//!
//! Provides:
//! - Liveness (`GET /`)
//! - Learning path, insight, next-insight and review generation under `/api/ai`

pub mod extract;
pub mod health;
pub mod learning;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use learning_agent::LearningEngine;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn LearningEngine>,
}

impl AppState {
    pub fn new(engine: Arc<dyn LearningEngine>) -> Self {
        Self { engine }
    }
}

/// Build the service router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/api/ai/generate-learning-path", post(learning::generate_learning_path))
        .route("/api/ai/generate-insights", post(learning::generate_insights))
        .route("/api/ai/get-next-insight", post(learning::get_next_insight))
        .route("/api/ai/generate-review", post(learning::generate_review))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}
