//! LLM Backend abstraction layer.
//!
//! Provides a trait-based interface over hosted inference APIs:
//! - OpenAI-compatible HTTP (Groq, Google Gemini, OpenAI)
//! - `provider:model` identifiers and credential-aware construction
//! - Mock backend for testing

pub mod mock;
pub mod openai;
pub mod provider;
pub mod traits;

pub use mock::{CallLog, MockBackend, MockReply};
pub use openai::OpenAiBackend;
pub use provider::{build_backends, ModelSpec, ModelSpecError, Provider, ProviderKeys};
pub use traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError, Message};
