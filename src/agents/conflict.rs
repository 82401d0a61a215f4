//! Conflict Detector
//!
//! Pure predicate over standardized metadata and the raw date candidates.
//! Any flag sends the document through conflict resolution; all flags are
//! passed along so one pass can address them together.

use super::dates::{authoritative_date, parse_date};
use super::standards::Standardized;
use crate::config::ConflictConfig;
use crate::types::{ConflictFlag, ConflictFlags, DateCandidate, RawMetadata};

pub fn detect_conflicts(
    raw: &RawMetadata,
    standardized: &Standardized,
    config: &ConflictConfig,
) -> ConflictFlags {
    let mut flags = ConflictFlags::new();

    if has_date_conflict(&raw.dates_raw, &standardized.normalized.doctype, config) {
        flags.insert(ConflictFlag::MultipleDates);
    }

    if !standardized.vendor_matched || raw.vendor_raw.trim().is_empty() {
        flags.insert(ConflictFlag::UnknownVendor);
    }

    if raw.multi_purpose {
        flags.insert(ConflictFlag::MultiPurposeDocument);
    }

    if !standardized.taxonomy_mismatches.is_empty() {
        flags.insert(ConflictFlag::TaxonomyMismatch);
    }

    flags
}

/// Two parseable candidates further apart than the tolerance, with no
/// authoritative label for the doctype to settle it.
pub fn has_date_conflict(
    candidates: &[DateCandidate],
    doctype: &str,
    config: &ConflictConfig,
) -> bool {
    let dates: Vec<_> = candidates
        .iter()
        .filter_map(|c| parse_date(&c.value))
        .collect();
    if dates.len() < 2 {
        return false;
    }

    let (Some(earliest), Some(latest)) = (
        dates.iter().min_by_key(|d| d.start()),
        dates.iter().max_by_key(|d| d.start()),
    ) else {
        return false;
    };
    if earliest.days_between(latest) <= config.date_tolerance_days {
        return false;
    }

    authoritative_date(candidates, doctype, config).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::dates::DateSource;
    use crate::types::NormalizedMetadata;
    use proptest::prelude::*;

    fn standardized(doctype: &str) -> Standardized {
        Standardized {
            normalized: NormalizedMetadata {
                domain: "financial".to_string(),
                category: "banking".to_string(),
                doctype: doctype.to_string(),
                vendor_name: "chase".to_string(),
                ..Default::default()
            },
            vendor_matched: true,
            taxonomy_mismatches: Vec::new(),
            warnings: Vec::new(),
            date_source: DateSource::None,
        }
    }

    fn raw(dates: Vec<DateCandidate>) -> RawMetadata {
        RawMetadata {
            vendor_raw: "Chase".to_string(),
            dates_raw: dates,
            ..Default::default()
        }
    }

    #[test]
    fn test_authoritative_statement_date_resolves_silently() {
        let raw = raw(vec![
            DateCandidate::new("statement_date", "2025-01-31"),
            DateCandidate::new("received_date", "2025-02-05"),
        ]);
        let flags = detect_conflicts(&raw, &standardized("statement"), &ConflictConfig::default());
        assert!(!flags.contains(ConflictFlag::MultipleDates));
        assert!(flags.is_empty());
    }

    #[test]
    fn test_disagreeing_dates_without_authority() {
        let raw = raw(vec![
            DateCandidate::new("printed_date", "2025-01-31"),
            DateCandidate::new("received_date", "2025-02-05"),
        ]);
        let flags = detect_conflicts(&raw, &standardized("statement"), &ConflictConfig::default());
        assert!(flags.contains(ConflictFlag::MultipleDates));
    }

    #[test]
    fn test_tolerance_absorbs_small_gaps() {
        let raw = raw(vec![
            DateCandidate::new("a", "2025-01-31"),
            DateCandidate::new("b", "2025-02-05"),
        ]);
        let config = ConflictConfig {
            date_tolerance_days: 7,
            ..Default::default()
        };
        assert!(!detect_conflicts(&raw, &standardized("letter"), &config)
            .contains(ConflictFlag::MultipleDates));
    }

    #[test]
    fn test_identical_dates_do_not_conflict() {
        let raw = raw(vec![
            DateCandidate::new("a", "2025-01-31"),
            DateCandidate::new("b", "January 31, 2025"),
        ]);
        assert!(!has_date_conflict(&raw.dates_raw, "letter", &ConflictConfig::default()));
    }

    #[test]
    fn test_empty_vendor_flags_unknown_vendor() {
        let raw = RawMetadata {
            vendor_raw: String::new(),
            ..Default::default()
        };
        let mut standardized = standardized("statement");
        standardized.vendor_matched = false;
        standardized.normalized.vendor_name = "unknown_vendor".to_string();

        let flags = detect_conflicts(&raw, &standardized, &ConflictConfig::default());
        assert!(flags.contains(ConflictFlag::UnknownVendor));
    }

    #[test]
    fn test_multi_purpose_and_mismatch_are_additive() {
        let raw = RawMetadata {
            vendor_raw: "Chase".to_string(),
            multi_purpose: true,
            ..Default::default()
        };
        let mut standardized = standardized("statement");
        standardized.taxonomy_mismatches.push("category".to_string());

        let flags = detect_conflicts(&raw, &standardized, &ConflictConfig::default());
        assert_eq!(
            flags.to_vec(),
            vec![ConflictFlag::MultiPurposeDocument, ConflictFlag::TaxonomyMismatch]
        );
    }

    proptest! {
        #[test]
        fn prop_disagreeing_unlabeled_dates_always_flag(
            first in 0i64..20_000,
            gap in 1i64..5_000,
            doctype in prop::sample::select(vec!["statement", "receipt", "contract", "form", "letter"]),
        ) {
            let base = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            let a = base + chrono::Duration::days(first);
            let b = a + chrono::Duration::days(gap);
            let raw = raw(vec![
                DateCandidate::new("printed_date", a.format("%Y-%m-%d").to_string()),
                DateCandidate::new("received_date", b.format("%Y-%m-%d").to_string()),
            ]);

            let flags = detect_conflicts(&raw, &standardized(doctype), &ConflictConfig::default());
            prop_assert!(flags.contains(ConflictFlag::MultipleDates));
        }
    }
}
