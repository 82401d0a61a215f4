pub mod error;
pub mod metadata;
pub mod utils;

pub use error::{
    ErrorCategory, ErrorClassifier, ExtractionErrorKind, FailureKind, FilerError, LlmError,
    Result, ResultExt,
};
pub use metadata::{
    ClassificationResult, ConflictFlag, ConflictFlags, DateCandidate, NormalizedMetadata,
    RawMetadata, ResolvedMetadata, ResultMetadata, ResultStatus,
};
pub use utils::{capitalize_first, json_string, json_string_array, truncate_chars};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Type-safe wrapper for batch run IDs
///
/// Tags every log line of one `classify` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string()[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_is_short_and_unique() {
        let a = RunId::generate();
        let b = RunId::generate();
        assert_eq!(a.as_str().len(), 8);
        assert_ne!(a, b);
    }
}
