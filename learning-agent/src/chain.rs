//! Ordered model fallback chains.
//!
//! A chain holds backends in priority order. A call walks the list until one
//! backend produces content that passes the caller's parser; every other
//! outcome (transport error, timeout, unparseable or invalid content) moves on
//! to the next backend.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError};
use crate::output::OutputError;

/// What went wrong with one backend.
#[derive(Debug, Clone)]
pub enum FailureKind {
    /// The backend could not produce a response.
    Backend(LlmError),
    /// The backend answered, but the content was rejected.
    InvalidOutput { content: String, error: OutputError },
}

#[derive(Debug, Clone)]
pub struct BackendFailure {
    pub backend: String,
    pub kind: FailureKind,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FailureKind::Backend(e) => write!(f, "{}: {}", self.backend, e),
            FailureKind::InvalidOutput { error, .. } => write!(f, "{}: {}", self.backend, error),
        }
    }
}

/// Every backend in a chain failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", describe_exhausted(.chain, .failures))]
pub struct ChainExhausted {
    pub chain: String,
    pub failures: Vec<BackendFailure>,
}

fn describe_exhausted(chain: &str, failures: &[BackendFailure]) -> String {
    if failures.is_empty() {
        return format!("chain '{}' has no backends", chain);
    }
    let details: Vec<String> = failures.iter().map(ToString::to_string).collect();
    format!(
        "all {} backends in chain '{}' failed: {}",
        failures.len(),
        chain,
        details.join("; ")
    )
}

impl ChainExhausted {
    /// Whether any backend answered with content that was rejected.
    pub fn has_invalid_output(&self) -> bool {
        self.failures
            .iter()
            .any(|f| matches!(f.kind, FailureKind::InvalidOutput { .. }))
    }

    /// The most recent rejected content and why it was rejected.
    pub fn last_invalid_output(&self) -> Option<(&str, &OutputError)> {
        self.failures.iter().rev().find_map(|f| match &f.kind {
            FailureKind::InvalidOutput { content, error } => Some((content.as_str(), error)),
            FailureKind::Backend(_) => None,
        })
    }
}

/// Successful chain call.
#[derive(Debug)]
pub struct ChainSuccess<T> {
    pub value: T,
    pub backend: String,
    pub response: CompletionResponse,
}

/// An ordered list of backends tried in sequence.
pub struct FallbackChain {
    name: String,
    backends: Vec<Arc<dyn LlmBackend>>,
}

impl FallbackChain {
    pub fn new(name: impl Into<String>, backends: Vec<Arc<dyn LlmBackend>>) -> Self {
        Self {
            name: name.into(),
            backends,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Backend identifiers in priority order.
    pub fn backend_ids(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    /// Run `request` against each backend until `parse` accepts a response.
    pub async fn complete<T, F>(
        &self,
        request: &CompletionRequest,
        parse: F,
    ) -> Result<ChainSuccess<T>, ChainExhausted>
    where
        F: Fn(&str) -> Result<T, OutputError>,
    {
        let mut failures = Vec::new();

        for backend in &self.backends {
            let id = backend.id().to_string();

            let response = match backend.complete(request.clone()).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(chain = %self.name, backend = %id, error = %e, "Backend call failed");
                    failures.push(BackendFailure {
                        backend: id,
                        kind: FailureKind::Backend(e),
                    });
                    continue;
                }
            };

            match parse(&response.content) {
                Ok(value) => {
                    debug!(
                        chain = %self.name,
                        backend = %id,
                        skipped = failures.len(),
                        "Backend produced valid output"
                    );
                    return Ok(ChainSuccess {
                        value,
                        backend: id,
                        response,
                    });
                }
                Err(error) => {
                    warn!(chain = %self.name, backend = %id, error = %error, "Backend output rejected");
                    failures.push(BackendFailure {
                        backend: id,
                        kind: FailureKind::InvalidOutput {
                            content: response.content,
                            error,
                        },
                    });
                }
            }
        }

        Err(ChainExhausted {
            chain: self.name.clone(),
            failures,
        })
    }
}

impl fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("name", &self.name)
            .field("backends", &self.backend_ids())
            .finish()
    }
}
