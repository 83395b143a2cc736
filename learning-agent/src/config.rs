//! Engine configuration and construction.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::agent::AgentConfig;
use crate::backend::provider::{build_backends, ModelSpec, ModelSpecError, ProviderKeys};
use crate::chain::FallbackChain;
use crate::engine::LearningEngine;
use crate::offline::OfflineEngine;
use crate::pipeline::{Agents, LearningPipeline};

/// Default order for the planning chain (Planner, Curriculum).
pub const DEFAULT_PLANNING_MODELS: &str = "\
groq:openai/gpt-oss-120b,\
google-gla:gemini-2.5-flash,\
groq:deepseek-r1-distill-llama-70b,\
groq:llama-3.3-70b-versatile,\
google-gla:gemini-2.5-flash-lite,\
groq:moonshotai/kimi-k2-instruct-0905,\
groq:meta-llama/llama-4-maverick-17b-128e-instruct,\
google-gla:gemini-2.5-pro";

/// Default order for the content chain (Analyzer, writers, Reviewer).
pub const DEFAULT_CONTENT_MODELS: &str = "\
google-gla:gemini-2.5-flash,\
groq:openai/gpt-oss-120b,\
groq:llama-3.3-70b-versatile,\
groq:deepseek-r1-distill-llama-70b,\
google-gla:gemini-2.5-flash-lite,\
groq:moonshotai/kimi-k2-instruct-0905,\
groq:meta-llama/llama-4-maverick-17b-128e-instruct,\
google-gla:gemini-2.5-pro";

/// Whether content comes from hosted models or canned data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Live,
    Offline,
}

impl EngineMode {
    /// Interpret an `LLM_MODE` value. Anything not clearly live is offline.
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "real" | "live" | "prod" | "production" | "true" | "1" => EngineMode::Live,
            _ => EngineMode::Offline,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineMode::Live => "live",
            EngineMode::Offline => "offline",
        }
    }
}

/// Errors building an engine.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    ModelSpec(#[from] ModelSpecError),

    #[error("no usable backend in the {chain} chain; set the API key for one of: {models}")]
    EmptyChain { chain: &'static str, models: String },
}

/// Everything needed to build a [`LearningEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub mode: EngineMode,
    pub planning_models: Vec<ModelSpec>,
    pub content_models: Vec<ModelSpec>,
    pub keys: ProviderKeys,
    pub request_timeout: Duration,
    pub agent: AgentConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EngineMode::Offline,
            planning_models: ModelSpec::parse_list(DEFAULT_PLANNING_MODELS).unwrap_or_default(),
            content_models: ModelSpec::parse_list(DEFAULT_CONTENT_MODELS).unwrap_or_default(),
            keys: ProviderKeys::default(),
            request_timeout: Duration::from_secs(60),
            agent: AgentConfig::default(),
        }
    }
}

fn build_chain(
    name: &'static str,
    specs: &[ModelSpec],
    config: &EngineConfig,
) -> Result<Arc<FallbackChain>, ConfigError> {
    let backends = build_backends(specs, &config.keys, config.request_timeout);
    if backends.is_empty() {
        let models: Vec<String> = specs.iter().map(ToString::to_string).collect();
        return Err(ConfigError::EmptyChain {
            chain: name,
            models: models.join(", "),
        });
    }

    let chain = FallbackChain::new(name, backends);
    info!(chain = name, backends = ?chain.backend_ids(), "Fallback chain ready");
    Ok(Arc::new(chain))
}

/// Build the engine selected by `config.mode`.
pub fn build_engine(config: &EngineConfig) -> Result<Arc<dyn LearningEngine>, ConfigError> {
    match config.mode {
        EngineMode::Offline => Ok(Arc::new(OfflineEngine::new())),
        EngineMode::Live => {
            let planning = build_chain("planning", &config.planning_models, config)?;
            let content = build_chain("content", &config.content_models, config)?;
            let agents = Agents::new(planning, content, config.agent.clone());
            Ok(Arc::new(LearningPipeline::new(agents)))
        }
    }
}
