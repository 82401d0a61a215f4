//! Document Metadata Records
//!
//! The records that flow through the classification pipeline, from the raw
//! model answer to the externally visible `ClassificationResult`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Stage Records
// =============================================================================

/// A date found in the document together with where it came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateCandidate {
    /// Source label such as "statement_date" or "received_date"
    pub label: String,
    /// Date text as printed in the document
    pub value: String,
}

impl DateCandidate {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Unnormalized metadata produced by the classification stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMetadata {
    pub domain: String,
    pub category: String,
    pub doctype: String,
    pub vendor_raw: String,
    pub dates_raw: Vec<DateCandidate>,
    pub subject_raw: String,
    /// Document plausibly belongs to more than one domain/category
    pub multi_purpose: bool,
    /// Account kinds mentioned in the document (checking, brokerage, ...)
    pub account_types: Vec<String>,
}

/// Canonical metadata produced by the standards stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizedMetadata {
    pub domain: String,
    pub category: String,
    pub doctype: String,
    /// Canonical vendor slug
    pub vendor_name: String,
    /// YYYY, YYYYMM or YYYYMMDD, or empty when unknown
    pub date: String,
    /// One to three word slug, possibly empty
    pub subject: String,
}

/// Output of the conflict resolution stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMetadata {
    pub final_path: String,
    pub alternative_paths: Vec<String>,
    pub resolution_notes: String,
}

// =============================================================================
// Conflict Flags
// =============================================================================

/// Ambiguity condition that requires a disambiguation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictFlag {
    MultipleDates,
    UnknownVendor,
    MultiPurposeDocument,
    TaxonomyMismatch,
}

impl ConflictFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleDates => "multiple_dates",
            Self::UnknownVendor => "unknown_vendor",
            Self::MultiPurposeDocument => "multi_purpose_document",
            Self::TaxonomyMismatch => "taxonomy_mismatch",
        }
    }
}

impl fmt::Display for ConflictFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, duplicate-free set of conflict flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictFlags(BTreeSet<ConflictFlag>);

impl ConflictFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, flag: ConflictFlag) -> bool {
        self.0.insert(flag)
    }

    pub fn contains(&self, flag: ConflictFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ConflictFlag> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ConflictFlag> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<ConflictFlag> for ConflictFlags {
    fn from_iter<I: IntoIterator<Item = ConflictFlag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ConflictFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|flag| flag.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

// =============================================================================
// Classification Result
// =============================================================================

/// Terminal status of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// Metadata accepted as standardized (possibly after a failed resolution)
    Finalized,
    /// Conflicts were flagged and resolved
    Resolved,
    Failed,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finalized => write!(f, "finalized"),
            Self::Resolved => write!(f, "resolved"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Metadata block of an emitted result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultMetadata {
    pub domain: String,
    pub category: String,
    pub doctype: String,
    pub vendor: String,
    pub date: String,
    pub subject: String,
}

impl From<&NormalizedMetadata> for ResultMetadata {
    fn from(meta: &NormalizedMetadata) -> Self {
        Self {
            domain: meta.domain.clone(),
            category: meta.category.clone(),
            doctype: meta.doctype.clone(),
            vendor: meta.vendor_name.clone(),
            date: meta.date.clone(),
            subject: meta.subject.clone(),
        }
    }
}

/// One record per input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub original: String,
    pub suggested_path: String,
    pub suggested_name: String,
    pub full_path: String,
    pub metadata: ResultMetadata,
    pub status: ResultStatus,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ConflictFlag>,
}

impl ClassificationResult {
    /// Result for a document that reached a terminal failure
    pub fn failed(original: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            suggested_path: String::new(),
            suggested_name: String::new(),
            full_path: String::new(),
            metadata: ResultMetadata::default(),
            status: ResultStatus::Failed,
            notes: notes.into(),
            alternative_paths: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ResultStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_flags_are_ordered_and_unique() {
        let mut flags = ConflictFlags::new();
        assert!(flags.insert(ConflictFlag::UnknownVendor));
        assert!(flags.insert(ConflictFlag::MultipleDates));
        assert!(!flags.insert(ConflictFlag::UnknownVendor));

        assert_eq!(flags.len(), 2);
        assert_eq!(flags.to_string(), "multiple_dates, unknown_vendor");
    }

    #[test]
    fn test_conflict_flag_serializes_snake_case() {
        let json = serde_json::to_string(&ConflictFlag::MultiPurposeDocument).unwrap();
        assert_eq!(json, "\"multi_purpose_document\"");
    }

    #[test]
    fn test_raw_metadata_tolerates_missing_fields() {
        let raw: RawMetadata = serde_json::from_str(
            r#"{"domain": "financial", "dates_raw": [{"label": "statement_date", "value": "2025-01-31"}]}"#,
        )
        .unwrap();
        assert_eq!(raw.domain, "financial");
        assert!(raw.vendor_raw.is_empty());
        assert!(!raw.multi_purpose);
        assert_eq!(raw.dates_raw[0].label, "statement_date");
    }

    #[test]
    fn test_failed_result_serialization() {
        let result = ClassificationResult::failed("scan.pdf", "extraction_failure: unreadable");
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["status"], "failed");
        assert_eq!(value["original"], "scan.pdf");
        assert_eq!(value["metadata"]["vendor"], "");
        assert!(value.get("alternative_paths").is_none());
        assert!(value.get("conflicts").is_none());
    }
}
