//! Text generation clients.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ensure_success, http_client, CollaboratorError};
use crate::config::{LlmConfig, LlmProvider};
use crate::metrics;

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Request for a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System prompt (instructions for the model)
    pub system: Option<String>,
    /// User message
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 1024,
            temperature: 0.7,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The generated text
    pub text: String,
    pub usage: TokenUsage,
    /// Model that produced the text
    pub model: String,
}

/// Generative text service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name (e.g., "openai", "anthropic")
    fn provider(&self) -> &str;

    fn model(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CollaboratorError>;
}

/// Build a generator for `model` from the LLM configuration.
pub fn create_text_generator(config: &LlmConfig, model: &str) -> Arc<dyn TextGenerator> {
    match config.provider {
        LlmProvider::Openai => {
            let mut client =
                OpenAiClient::new(&config.api_key, model).with_timeout(config.timeout_secs);
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base);
            }
            Arc::new(client)
        }
        LlmProvider::Anthropic => {
            let mut client =
                AnthropicClient::new(&config.api_key, model).with_timeout(config.timeout_secs);
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base);
            }
            Arc::new(client)
        }
    }
}

fn record_usage(provider: &str, started: Instant, result: &str, usage: Option<&TokenUsage>) {
    metrics::EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[provider, result])
        .inc();
    metrics::EXTERNAL_SERVICE_DURATION
        .with_label_values(&[provider])
        .observe(started.elapsed().as_secs_f64());
    if let Some(usage) = usage {
        metrics::LLM_TOKENS
            .with_label_values(&[provider, "input"])
            .inc_by(u64::from(usage.input_tokens));
        metrics::LLM_TOKENS
            .with_label_values(&[provider, "output"])
            .inc_by(u64::from(usage.output_tokens));
    }
}

// ============================================================================
// OpenAI-compatible Implementation
// ============================================================================

/// Client for OpenAI-compatible chat completion APIs.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            api_base: "https://api.openai.com".to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.client = http_client(timeout_secs);
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CollaboratorError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt,
        });

        let body = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let started = Instant::now();
        let result = async {
            let response = self
                .client
                .post(format!("{}/v1/chat/completions", self.api_base))
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;
            let response = ensure_success(response).await?;
            let chat: ChatResponse = response.json().await?;
            Ok::<_, CollaboratorError>(chat)
        }
        .await;

        let chat = match result {
            Ok(chat) => chat,
            Err(e) => {
                record_usage("openai", started, "error", None);
                return Err(e);
            }
        };

        let usage = chat
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();
        record_usage("openai", started, "success", Some(&usage));

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        debug!(model = %chat.model, chars = text.chars().count(), "openai completion");

        Ok(Completion {
            text,
            usage,
            model: chat.model,
        })
    }
}

// ============================================================================
// Anthropic Implementation
// ============================================================================

/// Anthropic API client.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            api_base: "https://api.anthropic.com".to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.client = http_client(timeout_secs);
        self
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<MessagesContent>,
    model: String,
    usage: MessagesUsage,
}

#[derive(Debug, Deserialize)]
struct MessagesContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    fn provider(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CollaboratorError> {
        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            system: request.system,
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt,
            }],
            temperature: request.temperature,
        };

        let started = Instant::now();
        let result = async {
            let response = self
                .client
                .post(format!("{}/v1/messages", self.api_base))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&body)
                .send()
                .await?;
            let response = ensure_success(response).await?;
            let messages: MessagesResponse = response.json().await?;
            Ok::<_, CollaboratorError>(messages)
        }
        .await;

        let messages = match result {
            Ok(messages) => messages,
            Err(e) => {
                record_usage("anthropic", started, "error", None);
                return Err(e);
            }
        };

        let usage = TokenUsage {
            input_tokens: messages.usage.input_tokens,
            output_tokens: messages.usage.output_tokens,
        };
        record_usage("anthropic", started, "success", Some(&usage));

        let text = messages
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(Completion {
            text,
            usage,
            model: messages.model,
        })
    }
}
