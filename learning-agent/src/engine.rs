//! The generation surface shared by the live pipeline and the offline engine.

use async_trait::async_trait;

use crate::agent::AgentError;
use crate::schema::{Insight, InsightsRequest, LearningPath, LearningPathRequest, Review, ReviewRequest};

/// Errors from a stage that has no fallback.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Produces learning content for the HTTP layer.
#[async_trait]
pub trait LearningEngine: Send + Sync {
    /// Short label for logs (`live`, `offline`).
    fn mode(&self) -> &'static str;

    async fn generate_learning_path(
        &self,
        request: &LearningPathRequest,
    ) -> Result<LearningPath, PipelineError>;

    async fn generate_insights(&self, request: &InsightsRequest) -> Result<Vec<Insight>, PipelineError>;

    async fn generate_review(&self, request: &ReviewRequest) -> Result<Review, PipelineError>;
}
