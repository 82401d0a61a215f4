//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provides error classification for retry decisions at the AI boundary and
//! a coarse failure taxonomy for per-document results.
//!
//! ## Error Categories
//!
//! - **RateLimit**: API rate limiting (wait and retry)
//! - **Timeout**: AI invocation exceeded its deadline (retry)
//! - **InvalidResponse**: Model answered with unusable output (retry)
//! - **Auth**: Authentication failures (fail fast)
//! - **Network**: Connectivity issues (retry with backoff)
//! - **Unavailable**: Provider unavailable (fail the stage)
//!
//! ## Failure Kinds
//!
//! Every `FilerError` maps onto one `FailureKind`, which is what a
//! document's result reports and what decides whether a run aborts.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories for retry decisions at the AI boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry same provider
    RateLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Invocation deadline exceeded - retry with backoff
    Timeout,
    /// Provider unavailable or model missing
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Model output could not be parsed into the requested schema
    InvalidResponse,
    /// Temporary server issues - retry same provider
    Transient,
    /// Unknown error - not retried
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::InvalidResponse => write!(f, "INVALID_RESPONSE"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is retryable on the same provider
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Timeout | Self::Transient | Self::InvalidResponse
        )
    }

    /// Get recommended retry delay for this category
    pub fn recommended_delay(&self) -> Duration {
        match self {
            Self::RateLimit => Duration::from_secs(30),
            Self::Network => Duration::from_secs(5),
            Self::Timeout => Duration::from_secs(2),
            Self::Transient => Duration::from_secs(2),
            Self::InvalidResponse => Duration::from_secs(1),
            _ => Duration::from_millis(500),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// LLM error with category, context, and retry hints
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for routing decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
    /// Suggested wait time before retry (if applicable)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            retry_after: None,
        }
    }

    /// Create error with provider context
    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            retry_after: None,
        }
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }

    /// Get recommended retry delay
    pub fn recommended_delay(&self) -> Duration {
        self.retry_after
            .unwrap_or_else(|| self.category.recommended_delay())
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps provider failure messages and statuses onto error categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30));
        }

        if lower.contains("auth")
            || lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("invalid key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("timeout") || lower.contains("timed out") {
            return LlmError::with_provider(ErrorCategory::Timeout, message, provider);
        }

        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("failed to connect")
            || lower.contains("dns")
            || lower.contains("unreachable")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider)
                .retry_after(Duration::from_secs(5));
        }

        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("service unavailable")
            || lower.contains("not found")
            || lower.contains("model not")
        {
            return LlmError::with_provider(ErrorCategory::Unavailable, message, provider);
        }

        if lower.contains("parse")
            || lower.contains("json")
            || lower.contains("syntax")
            || lower.contains("unexpected token")
            || lower.contains("schema")
        {
            return LlmError::with_provider(ErrorCategory::InvalidResponse, message, provider)
                .retry_after(Duration::from_secs(1));
        }

        if lower.contains("400") || lower.contains("bad request") || lower.contains("malformed")
        {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        if lower.contains("500")
            || lower.contains("server error")
            || lower.contains("retry")
            || lower.contains("temporary")
            || lower.contains("overloaded")
        {
            return LlmError::with_provider(ErrorCategory::Transient, message, provider)
                .retry_after(Duration::from_secs(2));
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 422 => LlmError::with_provider(ErrorCategory::BadRequest, message, provider),
            408 | 504 => LlmError::with_provider(ErrorCategory::Timeout, message, provider),
            500 | 502 => LlmError::with_provider(ErrorCategory::Transient, message, provider)
                .retry_after(Duration::from_secs(5)),
            503 | 404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Classify a reqwest transport error (no HTTP status available)
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        let message = err.to_string();
        if err.is_timeout() {
            LlmError::with_provider(ErrorCategory::Timeout, message, provider)
        } else if err.is_connect() {
            LlmError::with_provider(ErrorCategory::Network, message, provider)
                .retry_after(Duration::from_secs(5))
        } else if err.is_decode() {
            LlmError::with_provider(ErrorCategory::InvalidResponse, message, provider)
        } else {
            Self::classify(&message, provider)
        }
    }
}

// =============================================================================
// Failure Kinds
// =============================================================================

/// Coarse failure taxonomy reported on document results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Unreadable or unsupported document
    ExtractionFailure,
    /// AI call failed after retries
    AiInvocationFailure,
    /// Strict-mode unknown taxonomy value
    TaxonomyViolation,
    /// Disambiguation pass failed
    ConflictResolutionFailure,
    /// Invalid settings, credentials or taxonomy file; aborts the run
    ConfigurationError,
    /// Run cancelled before the document finished
    Cancelled,
    /// Anything else (I/O, storage, path limits)
    Internal,
}

impl FailureKind {
    /// Configuration failures abort the whole run instead of one document
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigurationError)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExtractionFailure => write!(f, "extraction_failure"),
            Self::AiInvocationFailure => write!(f, "ai_invocation_failure"),
            Self::TaxonomyViolation => write!(f, "taxonomy_violation"),
            Self::ConflictResolutionFailure => write!(f, "conflict_resolution_failure"),
            Self::ConfigurationError => write!(f, "configuration_error"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Why a document could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    UnreadableFile,
    UnsupportedFormat,
}

impl std::fmt::Display for ExtractionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnreadableFile => write!(f, "unreadable file"),
            Self::UnsupportedFormat => write!(f, "unsupported format"),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum FilerError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // AI Boundary Errors
    // -------------------------------------------------------------------------
    /// Structured LLM error with category and retry hints
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Extraction failed for {path}: {kind}: {message}")]
    Extraction {
        path: String,
        kind: ExtractionErrorKind,
        message: String,
    },

    #[error("Unknown {axis} value '{value}'")]
    UnknownTaxonomyValue { axis: String, value: String },

    #[error("Conflict resolution failed: {0}")]
    ConflictResolution(String),

    #[error("Path construction failed: {0}")]
    PathConstruction(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cancelled")]
    Cancelled,
}

impl From<LlmError> for FilerError {
    fn from(err: LlmError) -> Self {
        FilerError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, FilerError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl FilerError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create an extraction error
    pub fn extraction(
        path: impl Into<String>,
        kind: ExtractionErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Extraction {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Create an LLM error with category
    pub fn llm(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::Llm(LlmError::new(category, message))
    }

    /// Check if this error can be retried at the AI boundary
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Llm(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Suggested delay before retrying, if the error carries one
    pub fn retry_hint(&self) -> Option<Duration> {
        match self {
            Self::Llm(e) => e.retry_after,
            _ => None,
        }
    }

    /// Map this error onto the failure taxonomy
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Extraction { .. } => FailureKind::ExtractionFailure,
            Self::Llm(e) if e.category == ErrorCategory::Auth => FailureKind::ConfigurationError,
            Self::Llm(_) | Self::Timeout { .. } => FailureKind::AiInvocationFailure,
            Self::UnknownTaxonomyValue { .. } => FailureKind::TaxonomyViolation,
            Self::ConflictResolution(_) => FailureKind::ConflictResolutionFailure,
            Self::Config(_) | Self::Yaml(_) => FailureKind::ConfigurationError,
            Self::Cancelled => FailureKind::Cancelled,
            Self::Io(_)
            | Self::Database(_)
            | Self::Json(_)
            | Self::PathConstruction(_)
            | Self::Storage(_) => FailureKind::Internal,
        }
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| FilerError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| FilerError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
