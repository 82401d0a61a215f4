//! Per-document state machine.
//!
//! ```text
//! Pending → Extracted → Classified → Standardized ─┬→ Finalized
//!                                                   └→ ConflictPending ─┬→ Resolved
//!                                                                       └→ Finalized (resolution failed)
//! any stage error → Failed
//! ```

use std::fmt;

use crate::agents::{Resolution, Standardized};
use crate::extraction::ExtractedContent;
use crate::naming::BuiltPath;
use crate::types::{
    ClassificationResult, ConflictFlags, FailureKind, FilerError, RawMetadata, ResultMetadata,
    ResultStatus,
};

#[derive(Debug, Clone)]
pub enum DocumentState {
    Pending,
    Extracted {
        content: ExtractedContent,
    },
    Classified {
        raw: RawMetadata,
    },
    Standardized {
        raw: RawMetadata,
        standardized: Standardized,
        path: BuiltPath,
    },
    ConflictPending {
        raw: RawMetadata,
        standardized: Standardized,
        path: BuiltPath,
        flags: ConflictFlags,
    },
    Resolved {
        resolution: Resolution,
        flags: ConflictFlags,
        warnings: Vec<String>,
    },
    Finalized {
        standardized: Standardized,
        path: BuiltPath,
        flags: ConflictFlags,
        notes: Vec<String>,
    },
    Failed {
        kind: FailureKind,
        reason: String,
    },
}

impl DocumentState {
    pub fn failed(error: &FilerError) -> Self {
        Self::Failed {
            kind: error.kind(),
            reason: error.to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Extracted { .. } => "extracted",
            Self::Classified { .. } => "classified",
            Self::Standardized { .. } => "standardized",
            Self::ConflictPending { .. } => "conflict_pending",
            Self::Resolved { .. } => "resolved",
            Self::Finalized { .. } => "finalized",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Resolved { .. } | Self::Finalized { .. } | Self::Failed { .. }
        )
    }

    /// Convert a terminal state into the emitted record.
    ///
    /// Non-terminal states become a failed record; the runner never emits one.
    pub fn into_result(self, original: &str) -> ClassificationResult {
        match self {
            Self::Finalized {
                standardized,
                path,
                flags,
                notes,
            } => ClassificationResult {
                original: original.to_string(),
                suggested_path: path.directory_path(),
                full_path: path.full_path(),
                suggested_name: path.filename,
                metadata: ResultMetadata::from(&standardized.normalized),
                status: ResultStatus::Finalized,
                notes: notes.join("; "),
                alternative_paths: Vec::new(),
                conflicts: flags.to_vec(),
            },
            Self::Resolved {
                resolution,
                flags,
                warnings,
            } => {
                let mut notes = vec![resolution.resolved.resolution_notes.clone()];
                notes.extend(warnings);
                ClassificationResult {
                    original: original.to_string(),
                    suggested_path: resolution.path.directory_path(),
                    suggested_name: resolution.path.filename.clone(),
                    full_path: resolution.resolved.final_path.clone(),
                    metadata: ResultMetadata::from(&resolution.normalized),
                    status: ResultStatus::Resolved,
                    notes: notes.join("; "),
                    alternative_paths: resolution.resolved.alternative_paths,
                    conflicts: flags.to_vec(),
                }
            }
            Self::Failed { kind, reason } => {
                ClassificationResult::failed(original, format!("{}: {}", kind, reason))
            }
            other => ClassificationResult::failed(
                original,
                format!("internal: document stopped in state {}", other.name()),
            ),
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::DateSource;
    use crate::types::{ConflictFlag, NormalizedMetadata};

    fn standardized() -> Standardized {
        Standardized {
            normalized: NormalizedMetadata {
                domain: "financial".to_string(),
                category: "banking".to_string(),
                doctype: "statement".to_string(),
                vendor_name: "chase".to_string(),
                date: "20250131".to_string(),
                subject: "checking".to_string(),
            },
            vendor_matched: true,
            taxonomy_mismatches: Vec::new(),
            warnings: Vec::new(),
            date_source: DateSource::None,
        }
    }

    fn path() -> BuiltPath {
        BuiltPath {
            directory: vec![
                "Financial".to_string(),
                "Banking".to_string(),
                "Statements".to_string(),
            ],
            filename: "statement_chase_checking_20250131.pdf".to_string(),
        }
    }

    #[test]
    fn test_finalized_result_fields() {
        let state = DocumentState::Finalized {
            standardized: standardized(),
            path: path(),
            flags: ConflictFlags::new(),
            notes: Vec::new(),
        };
        assert!(state.is_terminal());

        let result = state.into_result("inbox/jan.pdf");
        assert_eq!(result.status, ResultStatus::Finalized);
        assert_eq!(result.suggested_path, "Financial/Banking/Statements/");
        assert_eq!(result.suggested_name, "statement_chase_checking_20250131.pdf");
        assert_eq!(
            result.full_path,
            "Financial/Banking/Statements/statement_chase_checking_20250131.pdf"
        );
        assert_eq!(result.metadata.vendor, "chase");
    }

    #[test]
    fn test_failed_result_carries_kind() {
        let err = FilerError::UnknownTaxonomyValue {
            axis: "domain".to_string(),
            value: "astrology".to_string(),
        };
        let result = DocumentState::failed(&err).into_result("x.pdf");
        assert!(result.is_failed());
        assert!(result.notes.starts_with("taxonomy_violation: "));
    }

    #[test]
    fn test_degraded_finalized_keeps_flags() {
        let flags: ConflictFlags = [ConflictFlag::UnknownVendor].into_iter().collect();
        let result = DocumentState::Finalized {
            standardized: standardized(),
            path: path(),
            flags,
            notes: vec!["conflict resolution failed: timeout".to_string()],
        }
        .into_result("x.pdf");
        assert_eq!(result.conflicts, vec![ConflictFlag::UnknownVendor]);
        assert!(result.notes.contains("conflict resolution failed"));
    }

    #[test]
    fn test_non_terminal_state_is_not_emitted_silently() {
        assert!(!DocumentState::Pending.is_terminal());
        let result = DocumentState::Pending.into_result("x.pdf");
        assert!(result.is_failed());
    }
}
