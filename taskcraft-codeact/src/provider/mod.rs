//! # LLM Provider Interface
//!
//! A trait-based abstraction for communicating with LLM backends.
//!
//! ## Design
//! - `LlmProvider` trait defines the core interface
//! - Implementations for OpenAI-compatible APIs and Anthropic
//! - Completions are non-streaming: the agent's streamed surface is the
//!   graph state sequence, not token deltas
//! - Usage tracking per model

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAIProvider;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Pretty print the message to stdout
    pub fn pretty_print(&self) {
        let role_str = match self.role {
            Role::System => "SYSTEM",
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
        };
        println!("[{}]", role_str);
        println!("{}", self.content);
        println!();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub stop: Option<Vec<String>>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Invalid request
    InvalidRequest(String),
    /// Model not found
    ModelNotFound(String),
    /// Authentication failed
    AuthenticationFailed,
    /// Other error
    Other(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
            Self::ModelNotFound(m) => write!(f, "Model not found: {}", m),
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// Get available models
    fn models(&self) -> Vec<String>;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Send a completion request and get a full response
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, ProviderError>> + Send;

    /// Simple prompt -> response helper
    async fn prompt(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)]);
        let response = self.complete(request).await?;
        response.content.ok_or_else(|| ProviderError::Other("No content in response".into()))
    }

    /// Chat with message history
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ProviderError> {
        let request = CompletionRequest::new(messages);
        let response = self.complete(request).await?;
        response.content.ok_or_else(|| ProviderError::Other("No content in response".into()))
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    /// Any OpenAI-compatible endpoint (vLLM, Ollama, local gateways)
    Compatible,
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            api_key: Some(api_key.into()),
            base_url: Some("https://api.openai.com/v1".into()),
            default_model: Some("gpt-4o".into()),
            headers: HashMap::new(),
            timeout_secs: Some(120),
        }
    }

    pub fn anthropic(api_key: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("anthropic-version".into(), "2023-06-01".into());

        Self {
            provider_type: ProviderType::Anthropic,
            api_key: Some(api_key.into()),
            base_url: Some("https://api.anthropic.com/v1".into()),
            default_model: Some("claude-sonnet-4-20250514".into()),
            headers,
            timeout_secs: Some(120),
        }
    }

    /// An OpenAI-compatible endpoint with no fixed vendor
    pub fn compatible(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Compatible,
            api_key: None,
            base_url: Some(base_url.into()),
            default_model: Some(model.into()),
            headers: HashMap::new(),
            timeout_secs: Some(300),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build a config from the environment.
    ///
    /// - `TASKCRAFT_PROVIDER`: "openai" (default) or "anthropic"
    /// - `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`: credentials
    /// - `TASKCRAFT_MODEL`: overrides the default model
    /// - `TASKCRAFT_BASE_URL`: overrides the endpoint (OpenAI-compatible)
    pub fn from_env() -> Result<Self, ProviderError> {
        let provider = std::env::var("TASKCRAFT_PROVIDER").unwrap_or_else(|_| "openai".into());

        let mut config = match provider.as_str() {
            "openai" => {
                let key = std::env::var("OPENAI_API_KEY")
                    .map_err(|_| ProviderError::AuthenticationFailed)?;
                Self::openai(key)
            }
            "anthropic" => {
                let key = std::env::var("ANTHROPIC_API_KEY")
                    .map_err(|_| ProviderError::AuthenticationFailed)?;
                Self::anthropic(key)
            }
            other => {
                return Err(ProviderError::InvalidRequest(format!(
                    "unknown provider type: {}",
                    other
                )))
            }
        };

        if let Ok(model) = std::env::var("TASKCRAFT_MODEL") {
            config = config.with_model(model);
        }
        if let Ok(url) = std::env::var("TASKCRAFT_BASE_URL") {
            config.base_url = Some(url);
        }

        Ok(config)
    }
}

// ============================================================================
// Runtime-selected provider
// ============================================================================

/// A provider selected at runtime from configuration.
///
/// The agent is generic over `LlmProvider`; callers that pick the backend
/// from the environment use this enum instead of a type parameter.
pub enum AnyProvider {
    OpenAI(OpenAIProvider),
    Anthropic(AnthropicProvider),
}

impl AnyProvider {
    pub fn from_config(config: ProviderConfig) -> Self {
        match config.provider_type {
            ProviderType::Anthropic => Self::Anthropic(AnthropicProvider::new(config)),
            ProviderType::OpenAI | ProviderType::Compatible => {
                Self::OpenAI(OpenAIProvider::new(config))
            }
        }
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        Ok(Self::from_config(ProviderConfig::from_env()?))
    }
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            Self::OpenAI(p) => p.name(),
            Self::Anthropic(p) => p.name(),
        }
    }

    fn models(&self) -> Vec<String> {
        match self {
            Self::OpenAI(p) => p.models(),
            Self::Anthropic(p) => p.models(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::OpenAI(p) => p.default_model(),
            Self::Anthropic(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        match self {
            Self::OpenAI(p) => p.complete(request).await,
            Self::Anthropic(p) => p.complete(request).await,
        }
    }
}

// ============================================================================
// Usage Tracking
// ============================================================================

/// Tracks token usage across multiple calls
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total_prompt_tokens: usize,
    pub total_completion_tokens: usize,
    pub by_model: HashMap<String, Usage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, model: &str, usage: &Usage) {
        self.total_calls += 1;
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;

        let entry = self.by_model.entry(model.to_string()).or_default();
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
        entry.total_tokens += usage.total_tokens;
    }

    pub fn total_tokens(&self) -> usize {
        self.total_prompt_tokens + self.total_completion_tokens
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Tests
// ============================================================================
