//! `provider:model` identifiers and backend construction.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::openai::OpenAiBackend;
use super::traits::{LlmBackend, LlmError};

/// Hosted vendor behind a model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Groq,
    Gemini,
    OpenAi,
}

impl Provider {
    /// Canonical prefix used in model identifiers.
    pub fn prefix(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::Gemini => "google-gla",
            Provider::OpenAi => "openai",
        }
    }

    /// Environment variable conventionally holding this provider's key.
    pub fn key_env(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Errors parsing a model identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelSpecError {
    #[error("model identifier '{0}' is missing a 'provider:' prefix")]
    MissingProvider(String),

    #[error("unknown provider '{provider}' in model identifier '{spec}'")]
    UnknownProvider { provider: String, spec: String },

    #[error("model identifier '{0}' has an empty model name")]
    EmptyModel(String),
}

/// A parsed `provider:model` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: Provider,
    pub model: String,
}

impl ModelSpec {
    /// Parse a comma separated list, ignoring blank entries.
    pub fn parse_list(list: &str) -> Result<Vec<ModelSpec>, ModelSpecError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ModelSpec::from_str)
            .collect()
    }
}

impl FromStr for ModelSpec {
    type Err = ModelSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        // Split on the first colon only; model names may contain slashes.
        let (prefix, model) = spec
            .split_once(':')
            .ok_or_else(|| ModelSpecError::MissingProvider(spec.to_string()))?;

        let provider = match prefix.trim().to_ascii_lowercase().as_str() {
            "groq" => Provider::Groq,
            "google-gla" | "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAi,
            other => {
                return Err(ModelSpecError::UnknownProvider {
                    provider: other.to_string(),
                    spec: spec.to_string(),
                })
            }
        };

        let model = model.trim();
        if model.is_empty() {
            return Err(ModelSpecError::EmptyModel(spec.to_string()));
        }

        Ok(ModelSpec {
            provider,
            model: model.to_string(),
        })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// API keys per provider.
#[derive(Clone, Default)]
pub struct ProviderKeys {
    pub groq: Option<String>,
    pub gemini: Option<String>,
    pub openai: Option<String>,
}

impl ProviderKeys {
    pub fn get(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Groq => self.groq.as_deref(),
            Provider::Gemini => self.gemini.as_deref(),
            Provider::OpenAi => self.openai.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }
}

impl fmt::Debug for ProviderKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |k: &Option<String>| if k.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ProviderKeys")
            .field("groq", &mask(&self.groq))
            .field("gemini", &mask(&self.gemini))
            .field("openai", &mask(&self.openai))
            .finish()
    }
}

/// Build a backend for `spec`.
pub fn build_backend(
    spec: &ModelSpec,
    keys: &ProviderKeys,
    timeout: Duration,
) -> Result<OpenAiBackend, LlmError> {
    let key = keys.get(spec.provider).ok_or_else(|| {
        LlmError::Unavailable(format!(
            "{} is not set, cannot use {}",
            spec.provider.key_env(),
            spec
        ))
    })?;

    match spec.provider {
        Provider::Groq => OpenAiBackend::groq(&spec.model, key, timeout),
        Provider::Gemini => OpenAiBackend::gemini(&spec.model, key, timeout),
        Provider::OpenAi => OpenAiBackend::openai(&spec.model, key, timeout),
    }
}

/// Build backends for every spec that has credentials, in order.
///
/// Specs whose provider has no key are skipped with a warning.
pub fn build_backends(
    specs: &[ModelSpec],
    keys: &ProviderKeys,
    timeout: Duration,
) -> Vec<Arc<dyn LlmBackend>> {
    let mut backends: Vec<Arc<dyn LlmBackend>> = Vec::with_capacity(specs.len());
    for spec in specs {
        match build_backend(spec, keys, timeout) {
            Ok(backend) => backends.push(Arc::new(backend)),
            Err(e) => warn!(model = %spec, error = %e, "Skipping model"),
        }
    }
    backends
}
