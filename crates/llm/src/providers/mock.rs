//! Mock LLM client for tests and offline development.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use hybrid_rag_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock provider returning canned replies.
///
/// Replies are consumed in order; once the queue is empty the default reply
/// is returned. Every request is recorded so tests can check how many
/// completions were issued and what they contained.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<AppResult<String>>>,
    default_reply: String,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    /// Create a mock that always answers with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            default_reply: reply.into(),
            ..Default::default()
        }
    }

    /// Queue a reply for the next unanswered request.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    /// Queue a failure for the next unanswered request.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.push(Err(AppError::Llm(message.into())));
        self
    }

    fn push(&self, reply: AppResult<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Copies of every request received, in order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let next = self
            .replies
            .lock()
            .map_err(|_| AppError::Llm("Mock reply queue poisoned".to_string()))?
            .pop_front();

        let content = match next {
            Some(reply) => reply?,
            None => self.default_reply.clone(),
        };

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}
