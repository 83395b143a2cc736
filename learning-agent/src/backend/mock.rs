//! Mock LLM backend for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{Barrier, Mutex};

use super::traits::*;

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this content.
    Content(String),
    /// Fail with this error.
    Fail(LlmError),
}

impl MockReply {
    pub fn content(content: impl Into<String>) -> Self {
        MockReply::Content(content.into())
    }

    pub fn json(value: serde_json::Value) -> Self {
        MockReply::Content(value.to_string())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        MockReply::Fail(LlmError::RequestFailed(message.into()))
    }
}

/// Log of backend calls shared between several mocks, to assert call order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Mock backend for testing.
///
/// Replies are resolved in this order: the first rule whose needle appears in
/// the request transcript, then the next queued reply, then the default.
pub struct MockBackend {
    model_id: String,
    default_reply: MockReply,
    queued: Mutex<VecDeque<MockReply>>,
    rules: Vec<(String, MockReply)>,
    requests: Mutex<Vec<CompletionRequest>>,
    call_log: Option<CallLog>,
    barrier: Option<Arc<Barrier>>,
    call_count: AtomicU32,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            default_reply: MockReply::content("Mock response"),
            queued: Mutex::new(VecDeque::new()),
            rules: Vec::new(),
            requests: Mutex::new(Vec::new()),
            call_log: None,
            barrier: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the default response content.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.default_reply = MockReply::Content(content.into());
        self
    }

    /// Set the default response to a JSON document.
    pub fn with_json(self, value: serde_json::Value) -> Self {
        self.with_response(value.to_string())
    }

    /// Make every unscripted call fail.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.default_reply = MockReply::fail(message);
        self
    }

    /// Queue replies consumed one per call before the default applies.
    pub fn with_replies(mut self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        self.queued.get_mut().extend(replies);
        self
    }

    /// Reply with `reply` whenever the request mentions `needle`.
    pub fn with_rule(mut self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// Record this backend's id in a log shared with other mocks.
    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.call_log = Some(log);
        self
    }

    /// Hold every call at `barrier` before replying. Calls only complete once
    /// enough of them are in flight together.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    /// Get the number of times complete was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_reply(&self, request: &CompletionRequest) -> MockReply {
        let transcript = request.transcript();
        if let Some((_, reply)) = self
            .rules
            .iter()
            .find(|(needle, _)| transcript.contains(needle.as_str()))
        {
            return reply.clone();
        }

        if let Some(reply) = self.queued.lock().await.pop_front() {
            return reply;
        }

        self.default_reply.clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(log) = &self.call_log {
            log.lock().await.push(self.model_id.clone());
        }

        let reply = self.next_reply(&request).await;
        self.requests.lock().await.push(request);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        match reply {
            MockReply::Content(content) => Ok(CompletionResponse {
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: (content.len() / 4) as u32,
                },
                ..CompletionResponse::text(content)
            }),
            MockReply::Fail(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_default_response() {
        let backend = MockBackend::new("test-model").with_response("Hello!");

        let response = backend
            .complete(CompletionRequest::user("Hi"))
            .await
            .unwrap();

        assert_eq!(response.content, "Hello!");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_backend_queue_then_default() {
        let backend = MockBackend::new("test-model")
            .with_response("fallback")
            .with_replies([MockReply::content("first"), MockReply::fail("boom")]);

        let first = backend.complete(CompletionRequest::user("a")).await.unwrap();
        assert_eq!(first.content, "first");

        let second = backend.complete(CompletionRequest::user("b")).await;
        assert!(matches!(second, Err(LlmError::RequestFailed(_))));

        let third = backend.complete(CompletionRequest::user("c")).await.unwrap();
        assert_eq!(third.content, "fallback");
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_backend_rules_match_transcript() {
        let backend = MockBackend::new("test-model")
            .with_response("generic")
            .with_rule("special", MockReply::content("matched"));

        let matched = backend
            .complete(CompletionRequest::user("a special request"))
            .await
            .unwrap();
        let generic = backend
            .complete(CompletionRequest::user("plain"))
            .await
            .unwrap();

        assert_eq!(matched.content, "matched");
        assert_eq!(generic.content, "generic");
        assert_eq!(backend.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_shared_call_log_records_order() {
        let log = CallLog::default();
        let a = MockBackend::new("a").with_call_log(log.clone());
        let b = MockBackend::new("b").with_call_log(log.clone());

        b.complete(CompletionRequest::user("x")).await.unwrap();
        a.complete(CompletionRequest::user("y")).await.unwrap();

        assert_eq!(*log.lock().await, vec!["b".to_string(), "a".to_string()]);
    }
}
