//! Path/filename builder.
//!
//! Deterministic and side-effect free: identical metadata, style and options
//! always produce identical output. Filesystem collisions are left to
//! whatever performs the move.

use regex::Regex;
use std::sync::LazyLock;

use super::format::{pluralize_doctype, title_case};
use crate::config::NamingStyle;
use crate::constants::naming::{MAX_HIERARCHY_DEPTH, MAX_PATH_LENGTH, UNKNOWN_VENDOR};
use crate::types::{FilerError, NormalizedMetadata, Result};

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}(\d{2}(\d{2})?)?$").expect("static regex"));

static COMPONENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("static regex"));

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]{1,10}$").expect("static regex"));

/// Caller-controlled layout switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathOptions {
    /// Insert the 4-digit year between category and doctype folders
    pub year_partitioned: bool,
    /// Append `_q1`..`_q4` to descriptive filenames
    pub quarterly: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPath {
    pub directory: Vec<String>,
    pub filename: String,
}

impl BuiltPath {
    /// Directory segments joined with `/`, with a trailing slash
    pub fn directory_path(&self) -> String {
        format!("{}/", self.directory.join("/"))
    }

    pub fn full_path(&self) -> String {
        format!("{}{}", self.directory_path(), self.filename)
    }
}

/// Build the archival directory and filename for a document.
pub fn build_path(
    metadata: &NormalizedMetadata,
    style: NamingStyle,
    extension: &str,
    options: PathOptions,
) -> Result<BuiltPath> {
    let extension = normalize_extension(extension)?;

    check_component("domain", &metadata.domain, false)?;
    check_component("category", &metadata.category, false)?;
    check_component("doctype", &metadata.doctype, false)?;
    check_component("vendor", &metadata.vendor_name, true)?;
    check_component("subject", &metadata.subject, true)?;
    if !metadata.date.is_empty() && !DATE_RE.is_match(&metadata.date) {
        return Err(FilerError::PathConstruction(format!(
            "date '{}' must be YYYY, YYYYMM or YYYYMMDD",
            metadata.date
        )));
    }

    let directory = directory_segments(metadata, options);
    if directory.len() + 1 > MAX_HIERARCHY_DEPTH {
        return Err(FilerError::PathConstruction(format!(
            "hierarchy depth {} exceeds {}",
            directory.len() + 1,
            MAX_HIERARCHY_DEPTH
        )));
    }

    let mut built = BuiltPath {
        filename: filename(metadata, style, &extension, options, true),
        directory,
    };

    if built.full_path().len() > MAX_PATH_LENGTH && !metadata.subject.is_empty() {
        built.filename = filename(metadata, style, &extension, options, false);
    }

    let length = built.full_path().len();
    if length > MAX_PATH_LENGTH {
        return Err(FilerError::PathConstruction(format!(
            "path is {} characters, limit is {}",
            length, MAX_PATH_LENGTH
        )));
    }

    Ok(built)
}

fn normalize_extension(extension: &str) -> Result<String> {
    let ext = extension.trim().trim_start_matches('.').to_lowercase();
    if EXTENSION_RE.is_match(&ext) {
        Ok(ext)
    } else {
        Err(FilerError::PathConstruction(format!(
            "invalid file extension '{}'",
            extension
        )))
    }
}

fn check_component(name: &str, value: &str, optional: bool) -> Result<()> {
    if value.is_empty() {
        return if optional {
            Ok(())
        } else {
            Err(FilerError::PathConstruction(format!("{} is empty", name)))
        };
    }
    if COMPONENT_RE.is_match(value) {
        Ok(())
    } else {
        Err(FilerError::PathConstruction(format!(
            "{} '{}' may only contain a-z, 0-9, '_' and '-'",
            name, value
        )))
    }
}

fn directory_segments(metadata: &NormalizedMetadata, options: PathOptions) -> Vec<String> {
    let mut segments = vec![title_case(&metadata.domain), title_case(&metadata.category)];

    if options.year_partitioned && metadata.date.len() >= 4 {
        segments.push(metadata.date[..4].to_string());
    }

    segments.push(pluralize_doctype(&metadata.doctype));
    segments
}

fn filename(
    metadata: &NormalizedMetadata,
    style: NamingStyle,
    extension: &str,
    options: PathOptions,
    with_subject: bool,
) -> String {
    let vendor = if metadata.vendor_name.is_empty() {
        UNKNOWN_VENDOR
    } else {
        metadata.vendor_name.as_str()
    };

    let parts: Vec<&str> = match style {
        NamingStyle::Descriptive => {
            let subject = if with_subject { metadata.subject.as_str() } else { "" };
            let quarter = if options.quarterly {
                quarter_suffix(&metadata.date)
            } else {
                None
            };
            vec![
                metadata.doctype.as_str(),
                vendor,
                subject,
                metadata.date.as_str(),
                quarter.unwrap_or(""),
            ]
        }
        NamingStyle::Compact => vec![vendor, metadata.date.as_str()],
    };

    let stem = parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    format!("{}.{}", stem, extension)
}

/// Quarter of a YYYYMM or YYYYMMDD date
fn quarter_suffix(date: &str) -> Option<&'static str> {
    let month: u32 = date.get(4..6)?.parse().ok()?;
    match month {
        1..=3 => Some("q1"),
        4..=6 => Some("q2"),
        7..=9 => Some("q3"),
        10..=12 => Some("q4"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chase_statement() -> NormalizedMetadata {
        NormalizedMetadata {
            domain: "financial".to_string(),
            category: "banking".to_string(),
            doctype: "statement".to_string(),
            vendor_name: "chase".to_string(),
            date: "20250131".to_string(),
            subject: "checking".to_string(),
        }
    }

    #[test]
    fn test_descriptive_chase_statement() {
        let built = build_path(
            &chase_statement(),
            NamingStyle::Descriptive,
            ".pdf",
            PathOptions::default(),
        )
        .unwrap();
        assert_eq!(
            built.directory,
            vec!["Financial", "Banking", "Statements"]
        );
        assert_eq!(
            built.full_path(),
            "Financial/Banking/Statements/statement_chase_checking_20250131.pdf"
        );
    }

    #[test]
    fn test_compact_omits_doctype_and_subject() {
        let built = build_path(
            &chase_statement(),
            NamingStyle::Compact,
            "PDF",
            PathOptions::default(),
        )
        .unwrap();
        assert_eq!(built.filename, "chase_20250131.pdf");
        assert_eq!(built.directory_path(), "Financial/Banking/Statements/");
    }

    #[test]
    fn test_empty_components_are_skipped() {
        let metadata = NormalizedMetadata {
            subject: String::new(),
            date: String::new(),
            ..chase_statement()
        };
        let built =
            build_path(&metadata, NamingStyle::Descriptive, "txt", PathOptions::default()).unwrap();
        assert_eq!(built.filename, "statement_chase.txt");
    }

    #[test]
    fn test_date_keeps_its_granularity() {
        let metadata = NormalizedMetadata {
            date: "202501".to_string(),
            ..chase_statement()
        };
        let built =
            build_path(&metadata, NamingStyle::Compact, "pdf", PathOptions::default()).unwrap();
        assert_eq!(built.filename, "chase_202501.pdf");
    }

    #[test]
    fn test_year_partitioned_category() {
        let metadata = NormalizedMetadata {
            domain: "tax".to_string(),
            category: "federal".to_string(),
            doctype: "w2".to_string(),
            vendor_name: "irs".to_string(),
            date: "20240415".to_string(),
            subject: String::new(),
        };
        let options = PathOptions {
            year_partitioned: true,
            quarterly: false,
        };
        let built = build_path(&metadata, NamingStyle::Descriptive, "pdf", options).unwrap();
        assert_eq!(
            built.full_path(),
            "Tax/Federal/2024/W2s/w2_irs_20240415.pdf"
        );
    }

    #[test]
    fn test_year_partition_without_date() {
        let metadata = NormalizedMetadata {
            domain: "tax".to_string(),
            category: "federal".to_string(),
            doctype: "1040".to_string(),
            vendor_name: "irs".to_string(),
            ..Default::default()
        };
        let options = PathOptions {
            year_partitioned: true,
            quarterly: false,
        };
        let built = build_path(&metadata, NamingStyle::Descriptive, "pdf", options).unwrap();
        assert_eq!(built.full_path(), "Tax/Federal/1040s/1040_irs.pdf");
    }

    #[test]
    fn test_quarter_suffix_only_on_request() {
        let options = PathOptions {
            year_partitioned: false,
            quarterly: true,
        };
        let built =
            build_path(&chase_statement(), NamingStyle::Descriptive, "pdf", options).unwrap();
        assert_eq!(built.filename, "statement_chase_checking_20250131_q1.pdf");

        let compact = build_path(&chase_statement(), NamingStyle::Compact, "pdf", options).unwrap();
        assert_eq!(compact.filename, "chase_20250131.pdf");

        let year_only = NormalizedMetadata {
            date: "2025".to_string(),
            ..chase_statement()
        };
        let built = build_path(&year_only, NamingStyle::Descriptive, "pdf", options).unwrap();
        assert_eq!(built.filename, "statement_chase_checking_2025.pdf");
    }

    #[test]
    fn test_missing_vendor_uses_placeholder() {
        let metadata = NormalizedMetadata {
            vendor_name: String::new(),
            ..chase_statement()
        };
        let built =
            build_path(&metadata, NamingStyle::Compact, "pdf", PathOptions::default()).unwrap();
        assert_eq!(built.filename, "unknown_vendor_20250131.pdf");
    }

    #[test]
    fn test_rejects_invalid_components() {
        let metadata = NormalizedMetadata {
            category: "Bank.ing".to_string(),
            ..chase_statement()
        };
        let err = build_path(&metadata, NamingStyle::Descriptive, "pdf", PathOptions::default())
            .unwrap_err();
        assert!(matches!(err, FilerError::PathConstruction(_)));

        let metadata = NormalizedMetadata {
            date: "2025-01-31".to_string(),
            ..chase_statement()
        };
        assert!(
            build_path(&metadata, NamingStyle::Descriptive, "pdf", PathOptions::default()).is_err()
        );

        assert!(
            build_path(&chase_statement(), NamingStyle::Descriptive, "p df", PathOptions::default())
                .is_err()
        );
    }

    #[test]
    fn test_long_subject_is_dropped() {
        let metadata = NormalizedMetadata {
            subject: "x".repeat(240),
            ..chase_statement()
        };
        let built =
            build_path(&metadata, NamingStyle::Descriptive, "pdf", PathOptions::default()).unwrap();
        assert_eq!(built.filename, "statement_chase_20250131.pdf");
    }

    #[test]
    fn test_overlong_path_fails() {
        let metadata = NormalizedMetadata {
            vendor_name: "v".repeat(260),
            ..chase_statement()
        };
        let err = build_path(&metadata, NamingStyle::Compact, "pdf", PathOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("limit is 255"));
    }

    fn slug() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,8}(_[a-z0-9]{1,6}){0,2}"
    }

    proptest! {
        #[test]
        fn prop_build_path_is_idempotent(
            domain in slug(),
            category in slug(),
            doctype in slug(),
            vendor in slug(),
            subject in proptest::option::of(slug()),
            date in proptest::option::of("[0-9]{4}([0-9]{2}([0-9]{2})?)?"),
            compact in any::<bool>(),
            quarterly in any::<bool>(),
            year_partitioned in any::<bool>(),
        ) {
            let metadata = NormalizedMetadata {
                domain,
                category,
                doctype,
                vendor_name: vendor,
                date: date.unwrap_or_default(),
                subject: subject.unwrap_or_default(),
            };
            let style = if compact { NamingStyle::Compact } else { NamingStyle::Descriptive };
            let options = PathOptions { year_partitioned, quarterly };

            let first = build_path(&metadata.clone(), style, "pdf", options).unwrap();
            let second = build_path(&metadata, style, "pdf", options).unwrap();
            prop_assert_eq!(first.full_path(), second.full_path());
            prop_assert_eq!(first.directory, second.directory);
        }
    }
}
