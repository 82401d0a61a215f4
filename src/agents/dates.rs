//! Date candidate parsing and selection.
//!
//! Dates keep the granularity they were printed with: a month-year stays
//! `YYYYMM`, a bare year stays `YYYY`.

use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::config::ConflictConfig;
use crate::taxonomy::normalize_token;
use crate::types::DateCandidate;

const FULL_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%m/%d/%Y", "%m-%d-%Y", "%B %d, %Y",
    "%B %d %Y", "%d %B %Y", "%d %B, %Y",
];

const MONTH_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%d %m/%Y"];

/// Date at the precision it was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParsedDate {
    Year(i32),
    Month(i32, u32),
    Day(NaiveDate),
}

impl ParsedDate {
    /// First day of the period, used for ordering and distance
    pub fn start(&self) -> NaiveDate {
        match *self {
            ParsedDate::Day(date) => date,
            ParsedDate::Month(y, m) => NaiveDate::from_ymd_opt(y, m, 1).unwrap_or_default(),
            ParsedDate::Year(y) => NaiveDate::from_ymd_opt(y, 1, 1).unwrap_or_default(),
        }
    }

    /// `YYYYMMDD`, `YYYYMM` or `YYYY`
    pub fn compact(&self) -> String {
        match *self {
            ParsedDate::Day(d) => format!("{:04}{:02}{:02}", d.year(), d.month(), d.day()),
            ParsedDate::Month(y, m) => format!("{:04}{:02}", y, m),
            ParsedDate::Year(y) => format!("{:04}", y),
        }
    }

    pub fn days_between(&self, other: &ParsedDate) -> i64 {
        (self.start() - other.start()).num_days().abs()
    }
}

impl fmt::Display for ParsedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compact())
    }
}

/// Parse a printed date. Returns `None` for anything unrecognized.
pub fn parse_date(raw: &str) -> Option<ParsedDate> {
    let cleaned: String = raw.trim().replace('.', " ").replace("  ", " ");
    let text = cleaned.trim();
    if text.is_empty() {
        return None;
    }

    // Timestamps: keep the date part
    let text = match text.get(..10) {
        Some(head) if text.len() > 10 && matches!(text.as_bytes()[10], b'T' | b' ') => head,
        _ => text,
    };

    for format in FULL_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return plausible(ParsedDate::Day(date));
        }
    }
    // "2025.01.31" arrives here as "2025 01 31"
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y %m %d") {
        return plausible(ParsedDate::Day(date));
    }

    for (candidate, format) in [
        (format!("{}-01", text), MONTH_FORMATS[0]),
        (format!("{}/01", text), MONTH_FORMATS[1]),
        (format!("1 {}", text), MONTH_FORMATS[2]),
        (format!("1 {}", text), MONTH_FORMATS[3]),
    ] {
        if let Ok(date) = NaiveDate::parse_from_str(&candidate, format) {
            return plausible(ParsedDate::Month(date.year(), date.month()));
        }
    }
    if text.len() == 6
        && text.bytes().all(|b| b.is_ascii_digit())
        && let Ok(date) = NaiveDate::parse_from_str(&format!("{}01", text), "%Y%m%d")
    {
        return plausible(ParsedDate::Month(date.year(), date.month()));
    }

    if text.len() == 4
        && let Ok(year) = text.parse::<i32>()
    {
        return plausible(ParsedDate::Year(year));
    }

    None
}

fn plausible(date: ParsedDate) -> Option<ParsedDate> {
    (1900..=2100).contains(&date.start().year()).then_some(date)
}

/// How the document date was chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSource {
    /// First usable candidate carrying an authoritative label for the doctype
    Authoritative(String),
    /// No authoritative candidate: the most recent parseable one
    MostRecent,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSelection {
    pub date: Option<ParsedDate>,
    pub source: DateSource,
}

/// The authoritative candidate for `doctype`, in precedence order.
///
/// Only candidates whose value parses count as present.
pub fn authoritative_date(
    candidates: &[DateCandidate],
    doctype: &str,
    config: &ConflictConfig,
) -> Option<(String, ParsedDate)> {
    config
        .authoritative_labels(doctype)
        .iter()
        .find_map(|label| {
            candidates
                .iter()
                .filter(|c| normalize_token(&c.label) == *label)
                .find_map(|c| parse_date(&c.value).map(|d| (label.clone(), d)))
        })
}

/// Pick the document date from its candidates.
pub fn select_date(
    candidates: &[DateCandidate],
    doctype: &str,
    config: &ConflictConfig,
) -> DateSelection {
    if let Some((label, date)) = authoritative_date(candidates, doctype, config) {
        return DateSelection {
            date: Some(date),
            source: DateSource::Authoritative(label),
        };
    }

    // Latest start wins; on a tie the finer granularity wins
    let latest = candidates
        .iter()
        .filter_map(|c| parse_date(&c.value))
        .max_by_key(|d| (d.start(), matches!(d, ParsedDate::Day(_))));

    match latest {
        Some(date) => DateSelection {
            date: Some(date),
            source: DateSource::MostRecent,
        },
        None => DateSelection {
            date: None,
            source: DateSource::None,
        },
    }
}
