//! LLM Provider Abstraction
//!
//! The AI collaborator boundary: a prompt plus a JSON schema in, structured
//! JSON out. Stages never inspect provider-specific details; every failure
//! arrives as a categorized [`LlmError`].

mod ollama;
mod openai;
mod prompt_utils;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::retry::{RetryPolicy, RetryingProvider};
use crate::config::LlmConfig;
use crate::types::{FilerError, Result};

/// Provider names accepted in `llm.provider`
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai", "ollama"];

// =============================================================================
// LLM Response
// =============================================================================

/// Parsed model answer with usage metrics
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Structured JSON content
    pub content: Value,
    pub usage: TokenUsage,
    pub timing: ResponseTiming,
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Response with content only (usage unknown)
    pub fn content_only(content: Value) -> Self {
        Self {
            content,
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTiming {
    /// Wall-clock time in milliseconds
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
}

/// Shared handle passed to every worker
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate structured output matching `schema`
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;
}

/// Build the configured provider wrapped in the retry/timeout boundary.
///
/// Fails with a configuration error for unknown providers or missing
/// credentials, before any document is processed.
pub fn create_provider(config: &LlmConfig) -> Result<SharedProvider> {
    let base: SharedProvider = match config.provider.as_str() {
        "openai" => Arc::new(OpenAiProvider::new(config)?),
        "ollama" => Arc::new(OllamaProvider::new(config)?),
        other => {
            return Err(FilerError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                other,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }
    };

    Ok(Arc::new(RetryingProvider::new(
        base,
        RetryPolicy::from_config(config),
    )))
}
