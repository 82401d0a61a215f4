//! Sampling plan selection.
//!
//! Pure function of document size, page count and configuration.

use serde::Serialize;
use std::fmt;

use crate::config::{ExtractionConfig, ExtractionStrategy};

/// Subset of a document fed to classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum SamplingPlan {
    /// Entire document
    Full,
    /// Pages `[0..n)` plus optionally the final page
    FirstNPages { n: usize, include_last: bool },
    /// Sequential read until the character budget is spent
    CharLimit { max_chars: usize },
    /// First `first` pages, one middle page and the last page
    Sparse { first: usize },
}

impl SamplingPlan {
    /// Zero-based page indices read from a document of `page_count` pages,
    /// ascending and deduplicated. `CharLimit` lists every page; the
    /// extractor stops once the budget is spent.
    pub fn page_indices(&self, page_count: usize) -> Vec<usize> {
        if page_count == 0 {
            return Vec::new();
        }
        let last = page_count - 1;

        let mut pages: Vec<usize> = match *self {
            SamplingPlan::Full | SamplingPlan::CharLimit { .. } => (0..page_count).collect(),
            SamplingPlan::FirstNPages { n, include_last } => {
                let mut pages: Vec<usize> = (0..n.min(page_count)).collect();
                if include_last {
                    pages.push(last);
                }
                pages
            }
            SamplingPlan::Sparse { first } => {
                let mut pages: Vec<usize> = (0..first.min(page_count)).collect();
                pages.push(page_count / 2);
                pages.push(last);
                pages
            }
        };

        pages.sort_unstable();
        pages.dedup();
        pages
    }

    /// Character budget, if the plan has one
    pub fn char_budget(&self) -> Option<usize> {
        match *self {
            SamplingPlan::CharLimit { max_chars } => Some(max_chars),
            _ => None,
        }
    }
}

impl fmt::Display for SamplingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingPlan::Full => write!(f, "full"),
            SamplingPlan::FirstNPages { n, include_last } => {
                write!(f, "first_n_pages(n={}, include_last={})", n, include_last)
            }
            SamplingPlan::CharLimit { max_chars } => write!(f, "char_limit({})", max_chars),
            SamplingPlan::Sparse { first } => write!(f, "sparse(first={}, middle, last)", first),
        }
    }
}

/// Choose how much of a document to read.
///
/// `page_count` is `None` for formats without pages (plain text). An
/// explicit strategy in `config` always wins over the adaptive thresholds.
pub fn select_strategy(
    size_bytes: u64,
    page_count: Option<usize>,
    config: &ExtractionConfig,
) -> SamplingPlan {
    match config.strategy {
        ExtractionStrategy::Full => SamplingPlan::Full,
        ExtractionStrategy::FirstPages => SamplingPlan::FirstNPages {
            n: config.pages,
            include_last: config.include_last,
        },
        ExtractionStrategy::CharLimit => SamplingPlan::CharLimit {
            max_chars: config.max_chars,
        },
        ExtractionStrategy::Adaptive => adaptive(size_bytes, page_count, config),
    }
}

fn adaptive(size_bytes: u64, page_count: Option<usize>, config: &ExtractionConfig) -> SamplingPlan {
    let small_pages = page_count.is_none_or(|pages| pages <= config.small_max_pages);
    if size_bytes <= config.small_max_bytes && small_pages {
        return SamplingPlan::Full;
    }

    if page_count.is_none() {
        return SamplingPlan::CharLimit {
            max_chars: config.max_chars,
        };
    }

    if size_bytes <= config.mid_max_bytes {
        SamplingPlan::FirstNPages {
            n: config.mid_pages,
            include_last: true,
        }
    } else {
        SamplingPlan::Sparse {
            first: config.sparse_first_pages,
        }
    }
}
