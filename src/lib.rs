//! docfiler - AI-Assisted Document Filing
//!
//! Classifies documents (PDF and plain text) against a controlled taxonomy
//! and suggests a deterministic archival path and filename for each one.
//!
//! ## Core Features
//!
//! - **Adaptive Extraction**: reads only as much of a document as its size warrants
//! - **Controlled Vocabulary**: YAML taxonomies with aliases, strict or flexible validation
//! - **Staged Pipeline**: classification, standardization, conflict detection and resolution
//! - **Deterministic Naming**: descriptive or compact filenames under `Domain/Category/Doctypes/`
//! - **Streaming Output**: one JSON/CSV/TSV record per input document
//!
//! ## Quick Start
//!
//! ```ignore
//! use docfiler::{BatchRunner, CancelSignal, Config, PipelineContext, TaxonomyLoader};
//! use docfiler::ai::create_provider;
//! use docfiler::extraction::FileExtractor;
//!
//! let config = Config::default();
//! let ctx = Arc::new(PipelineContext {
//!     taxonomy: Arc::new(TaxonomyLoader::load(&config.taxonomy)?),
//!     provider: create_provider(&config.llm)?,
//!     extractor: FileExtractor::shared(),
//!     cache: None,
//!     config: Arc::new(config),
//! });
//! let summary = BatchRunner::new(ctx)
//!     .run(paths, CancelSignal::never(), |result| {
//!         println!("{}", result.full_path);
//!         Ok(())
//!     })
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: LLM provider abstraction, retry/timeout boundary, prompt builder
//! - [`agents`]: classification, standards, conflict detection and resolution stages
//! - [`taxonomy`]: controlled vocabulary and canonicalization
//! - [`naming`]: archival path and filename construction
//! - [`pipeline`]: per-document state machine and batch runner
//! - [`storage`]: SQLite result cache with connection pooling

pub mod agents;
pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod extraction;
pub mod files;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod storage;
pub mod taxonomy;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, NamingStyle, OutputFormat, ValidationMode};

// Error Types
pub use types::error::{ErrorCategory, FailureKind, FilerError, Result, ResultExt};

// Records
pub use types::{ClassificationResult, ConflictFlag, NormalizedMetadata, RawMetadata, ResultStatus};

// Taxonomy
pub use taxonomy::{SharedTaxonomy, TaxonomyLoader, TaxonomyVocabulary};

// Storage
pub use storage::{Database, ResultCache, SharedCache};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{
    BatchRunner, BatchSummary, CancelHandle, CancelSignal, DocumentPipeline, DocumentState,
    PipelineContext,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{LlmProvider, LlmResponse, RetryPolicy, RetryingProvider, SharedProvider, with_timeout};
