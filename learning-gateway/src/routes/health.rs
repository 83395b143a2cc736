//! Liveness endpoint

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// GET /
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}
