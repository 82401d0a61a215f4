//! Batch classification pipeline
//!
//! Each document runs through extraction, classification, standardization,
//! conflict detection and (when flagged) resolution as an explicit state
//! machine. Documents are independent; the batch runner bounds concurrency
//! and always emits one result per input.

pub mod cancel;
pub mod runner;
pub mod state;

pub use cancel::{CancelHandle, CancelSignal, cancel_on_ctrl_c, cancel_pair};
pub use runner::{BatchRunner, BatchSummary, DocumentPipeline, PipelineContext};
pub use state::DocumentState;
