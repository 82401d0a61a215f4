//! Content Extraction
//!
//! Adaptive sampling plans and the text/PDF extraction collaborator.

mod extractor;
mod strategy;

pub use extractor::{
    ContentExtractor, DocumentFormat, DocumentProbe, ExtractedContent, FileExtractor,
    SharedExtractor,
};
pub use strategy::{SamplingPlan, select_strategy};
