//! Generation endpoints
//!
//! Handlers stay thin: decode and validate, call the engine, map errors.

use axum::{extract::State, Json};
use tracing::{error, info};

use learning_agent::schema::{
    Insight, InsightsRequest, LearningPath, LearningPathRequest, NextInsightRequest,
    NextInsightResponse, Review, ReviewRequest,
};
use learning_agent::select_next_insight;

use super::extract::ValidatedJson;
use super::AppState;
use crate::error::ApiError;

/// POST /api/ai/generate-learning-path
pub async fn generate_learning_path(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LearningPathRequest>,
) -> Result<Json<LearningPath>, ApiError> {
    info!(
        domain = %request.domain_name,
        user_id = ?request.user_id,
        engine = state.engine.mode(),
        "Learning path requested"
    );

    state
        .engine
        .generate_learning_path(&request)
        .await
        .map(Json)
        .map_err(|e| {
            error!(domain = %request.domain_name, error = %e, "Learning path generation failed");
            ApiError::Internal(format!("Failed to generate learning path: {}", e))
        })
}

/// POST /api/ai/generate-insights
pub async fn generate_insights(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<InsightsRequest>,
) -> Result<Json<Vec<Insight>>, ApiError> {
    info!(
        domain = %request.domain_name,
        topic = %request.topic_name,
        level = request.level,
        user_id = ?request.user_id,
        engine = state.engine.mode(),
        "Insights requested"
    );

    state
        .engine
        .generate_insights(&request)
        .await
        .map(Json)
        .map_err(|e| {
            error!(topic = %request.topic_name, error = %e, "Insight generation failed");
            ApiError::Internal(format!("Failed to generate insights: {}", e))
        })
}

/// POST /api/ai/get-next-insight
pub async fn get_next_insight(
    ValidatedJson(request): ValidatedJson<NextInsightRequest>,
) -> Result<Json<NextInsightResponse>, ApiError> {
    let insight_id = select_next_insight(&request.uncompleted_insights)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    info!(
        user_id = ?request.user_id,
        topic_progress_id = ?request.topic_progress_id,
        insight_id,
        "Next insight selected"
    );
    Ok(Json(NextInsightResponse { insight_id }))
}

/// POST /api/ai/generate-review
pub async fn generate_review(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    info!(
        user_id = ?request.user_id,
        topic_progress_id = ?request.topic_progress_id,
        engine = state.engine.mode(),
        "Review requested"
    );

    state
        .engine
        .generate_review(&request)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Review generation failed");
            ApiError::Internal(format!("Failed to generate review: {}", e))
        })
}
