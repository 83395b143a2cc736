//! Learning Agent - adaptive content generation over hosted LLMs
//!
//! Provides the core of the adaptive learning AI service:
//! - Validated data contracts for performance data and generated content
//! - Trait-based LLM backends reached through OpenAI-compatible APIs
//! - Ordered model fallback chains with per-call retry feedback
//! - The analyze → plan → generate → enrich pipeline with stage fallbacks
//! - Deterministic offline content and non-LLM next-insight selection
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        LearningEngine (trait)           │
//! │  LearningPipeline  |  OfflineEngine     │
//! └────────────────┬────────────────────────┘
//!                  │
//!                  ▼
//!          ┌───────────────┐
//!          │  Agent<O>     │  instruction + schema + retries
//!          └───────┬───────┘
//!                  ▼
//!          ┌───────────────┐
//!          │ FallbackChain │  planning / content
//!          └───────┬───────┘
//!                  ▼
//!          ┌───────────────┐
//!          │  LlmBackend   │  Groq, Gemini, OpenAI
//!          └───────────────┘
//! ```

pub mod agent;
pub mod backend;
pub mod chain;
pub mod config;
pub mod engine;
pub mod offline;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod schema;
pub mod selection;

// Re-export main types for convenience
pub use agent::{Agent, AgentConfig, AgentError};
pub use backend::traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError};
pub use chain::{ChainExhausted, FallbackChain};
pub use config::{build_engine, ConfigError, EngineConfig, EngineMode};
pub use engine::{LearningEngine, PipelineError};
pub use offline::OfflineEngine;
pub use pipeline::{Agents, LearningPipeline};
pub use selection::{select_next_insight, SelectionError};
