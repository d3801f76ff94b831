//! Mock text generator for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::collab::{CollaboratorError, Completion, CompletionRequest, TextGenerator, TokenUsage};

/// Mock implementation of the [`TextGenerator`] trait.
///
/// Responses are served from a queue in push order. With an empty queue the
/// call fails, which exercises the fallback paths of callers that have one.
///
/// # Example
///
/// ```rust,ignore
/// let llm = MockTextGenerator::new();
/// llm.push_response("robot, factory, automation").await;
///
/// let completion = llm.complete(CompletionRequest::new("keywords")).await?;
/// assert_eq!(llm.requests().await.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockTextGenerator {
    responses: Arc<RwLock<VecDeque<String>>>,
    requests: Arc<RwLock<Vec<CompletionRequest>>>,
    next_error: Arc<RwLock<Option<CollaboratorError>>>,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a completion text.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.responses.write().await.push_back(text.into());
    }

    /// Make the next call fail with `error`.
    pub async fn set_next_error(&self, error: CollaboratorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Every request received, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CollaboratorError> {
        self.requests.write().await.push(request);

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let text = self
            .responses
            .write()
            .await
            .pop_front()
            .ok_or_else(|| CollaboratorError::invalid_response("no mock response queued"))?;
        Ok(Completion {
            usage: TokenUsage {
                input_tokens: 0,
                output_tokens: text.chars().count() as u32,
            },
            text,
            model: "mock-model".to_string(),
        })
    }
}
