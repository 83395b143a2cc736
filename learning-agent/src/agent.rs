//! Generation agents.
//!
//! An agent is a fixed unit of work: one instruction, one output type, one
//! fallback chain, one retry budget and fixed sampling. Running it sends a JSON
//! payload through the chain and returns a validated value or an error; it
//! never makes content up.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::traits::{CompletionRequest, Message};
use crate::chain::{ChainExhausted, FallbackChain};
use crate::output::AgentOutput;
use crate::prompts::AgentRole;

/// Agent errors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("failed to encode {agent} payload: {source}")]
    Payload {
        agent: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{agent}: {source}")]
    ChainExhausted {
        agent: &'static str,
        #[source]
        source: ChainExhausted,
    },

    #[error("{agent} gave up after {retries} retries: {source}")]
    RetriesExhausted {
        agent: &'static str,
        retries: u32,
        #[source]
        source: ChainExhausted,
    },
}

/// Sampling and retry settings shared by agents.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Retries after a rejected response
    pub max_retries: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: Option<u32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_retries: 6,
            temperature: 0.8,
            top_p: 0.95,
            max_tokens: Some(4096),
        }
    }
}

/// A configured generation agent producing `O`.
pub struct Agent<O> {
    role: AgentRole,
    chain: Arc<FallbackChain>,
    config: AgentConfig,
    system_prompt: String,
    _output: PhantomData<fn() -> O>,
}

impl<O: AgentOutput> Agent<O> {
    pub fn new(role: AgentRole, chain: Arc<FallbackChain>, config: AgentConfig) -> Self {
        let system_prompt = format!(
            "{}\n\nRespond with a single JSON object and nothing else. It must validate against this JSON Schema:\n{}",
            role.instruction(),
            O::output_schema()
        );

        Self {
            role,
            chain,
            config,
            system_prompt,
            _output: PhantomData,
        }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn base_request(&self, payload: String) -> CompletionRequest {
        let mut request = CompletionRequest::user(payload)
            .with_system(self.system_prompt.clone())
            .with_temperature(self.config.temperature)
            .with_top_p(self.config.top_p)
            .with_json_output();
        if let Some(max) = self.config.max_tokens {
            request = request.with_max_tokens(max);
        }
        request
    }

    /// Run the agent on `payload`.
    pub async fn run<P>(&self, payload: &P) -> Result<O, AgentError>
    where
        P: Serialize + ?Sized,
    {
        let agent = self.role.name();
        let payload = serde_json::to_string(payload)
            .map_err(|source| AgentError::Payload { agent, source })?;

        let base = self.base_request(payload);
        let mut request = base.clone();
        let mut attempt = 0;

        loop {
            match self.chain.complete(&request, O::parse).await {
                Ok(success) => {
                    info!(
                        agent,
                        backend = %success.backend,
                        attempt,
                        prompt_tokens = success.response.usage.prompt_tokens,
                        completion_tokens = success.response.usage.completion_tokens,
                        "Agent run succeeded"
                    );
                    return Ok(success.value);
                }
                Err(exhausted) if !exhausted.has_invalid_output() => {
                    warn!(agent, chain = %exhausted.chain, "No backend answered");
                    return Err(AgentError::ChainExhausted {
                        agent,
                        source: exhausted,
                    });
                }
                Err(exhausted) => {
                    if attempt >= self.config.max_retries {
                        warn!(agent, retries = attempt, "Retry budget spent");
                        return Err(AgentError::RetriesExhausted {
                            agent,
                            retries: attempt,
                            source: exhausted,
                        });
                    }
                    attempt += 1;

                    request = base.clone();
                    if let Some((content, error)) = exhausted.last_invalid_output() {
                        debug!(agent, attempt, %error, "Retrying with validation feedback");
                        request = request
                            .with_message(Message::assistant(content))
                            .with_message(Message::user(format!(
                                "That response was rejected: {}. Reply again with corrected JSON only.",
                                error
                            )));
                    }
                }
            }
        }
    }
}
