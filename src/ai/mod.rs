//! AI Integration Layer
//!
//! Provider abstraction, the retry/timeout boundary, prompt construction and
//! JSON repair for model answers.

pub mod prompt;
pub mod provider;
pub mod retry;
pub mod timeout;
pub mod validation;

pub use prompt::{PromptBuilder, PromptSection};
pub use provider::{
    ErrorCategory, ErrorClassifier, LlmError, LlmProvider, LlmResponse, OllamaProvider,
    OpenAiProvider, ResponseMetadata, ResponseTiming, SharedProvider, TokenUsage,
    create_provider,
};
pub use retry::{RetryPolicy, RetryingProvider};
pub use timeout::with_timeout;
pub use validation::{JsonRepairer, extract_json_from_response};
