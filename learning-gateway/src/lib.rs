//! Learning Gateway - HTTP surface of the adaptive learning AI service
//!
//! Wires a [`learning_agent::LearningEngine`] into an axum router:
//! - `GET /` liveness
//! - `POST /api/ai/generate-learning-path`
//! - `POST /api/ai/generate-insights`
//! - `POST /api/ai/get-next-insight`
//! - `POST /api/ai/generate-review`

pub mod config;
pub mod error;
pub mod routes;

pub use config::Args;
pub use error::ApiError;
pub use routes::{create_router, AppState};

/// Service name used in the startup banner
pub const APP_NAME: &str = "Adaptive Learning AI Service";

/// Service version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
