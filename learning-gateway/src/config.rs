//! Configuration for the learning gateway
//!
//! CLI arguments and environment variable handling using clap. A `.env` file
//! is loaded before parsing, so every flag can also come from there.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use learning_agent::backend::{ModelSpec, ProviderKeys};
use learning_agent::config::{DEFAULT_CONTENT_MODELS, DEFAULT_PLANNING_MODELS};
use learning_agent::{AgentConfig, EngineConfig, EngineMode};

/// Adaptive Learning AI Service
#[derive(Parser, Debug, Clone)]
#[command(name = "learning-gateway")]
#[command(about = "HTTP service generating learning paths, insights and reviews")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// `real`, `live`, `prod`, `production`, `true` or `1` call hosted models;
    /// anything else serves canned offline content
    #[arg(long, env = "LLM_MODE", default_value = "mock")]
    pub llm_mode: String,

    /// Comma separated `provider:model` list for the Planner and Curriculum agents
    #[arg(long, env = "PLANNING_MODELS", default_value = DEFAULT_PLANNING_MODELS)]
    pub planning_models: String,

    /// Comma separated `provider:model` list for every other agent
    #[arg(long, env = "CONTENT_MODELS", default_value = DEFAULT_CONTENT_MODELS)]
    pub content_models: String,

    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Google Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Timeout for one model call in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "60000")]
    pub request_timeout_ms: u64,

    /// Retries after a rejected model response
    #[arg(long, env = "AGENT_RETRIES", default_value = "6")]
    pub agent_retries: u32,

    /// Sampling temperature
    #[arg(long, env = "LLM_TEMPERATURE", default_value = "0.8")]
    pub temperature: f32,

    /// Nucleus sampling cutoff
    #[arg(long, env = "LLM_TOP_P", default_value = "0.95")]
    pub top_p: f32,

    /// Maximum tokens per model response
    #[arg(long, env = "LLM_MAX_TOKENS", default_value = "4096")]
    pub max_tokens: u32,
}

impl Args {
    pub fn mode(&self) -> EngineMode {
        EngineMode::from_setting(&self.llm_mode)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("LLM_TEMPERATURE must be within 0..=2, got {}", self.temperature));
        }

        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(format!("LLM_TOP_P must be within (0, 1], got {}", self.top_p));
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.max_tokens == 0 {
            return Err("LLM_MAX_TOKENS must be greater than 0".to_string());
        }

        let planning = ModelSpec::parse_list(&self.planning_models).map_err(|e| e.to_string())?;
        let content = ModelSpec::parse_list(&self.content_models).map_err(|e| e.to_string())?;

        if self.mode() == EngineMode::Live && (planning.is_empty() || content.is_empty()) {
            return Err("PLANNING_MODELS and CONTENT_MODELS must each name at least one model".to_string());
        }

        Ok(())
    }

    /// Engine configuration. Call after [`Args::validate`].
    pub fn engine_config(&self) -> Result<EngineConfig, String> {
        Ok(EngineConfig {
            mode: self.mode(),
            planning_models: ModelSpec::parse_list(&self.planning_models).map_err(|e| e.to_string())?,
            content_models: ModelSpec::parse_list(&self.content_models).map_err(|e| e.to_string())?,
            keys: ProviderKeys {
                groq: self.groq_api_key.clone(),
                gemini: self.gemini_api_key.clone(),
                openai: self.openai_api_key.clone(),
            },
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            agent: AgentConfig {
                max_retries: self.agent_retries,
                temperature: self.temperature,
                top_p: self.top_p,
                max_tokens: Some(self.max_tokens),
            },
        })
    }
}
