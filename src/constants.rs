//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Extraction strategy thresholds
pub mod extraction {
    /// Documents at or below this size may be read in full (1 MiB)
    pub const SMALL_MAX_BYTES: u64 = 1024 * 1024;

    /// Documents with at most this many pages may be read in full
    pub const SMALL_MAX_PAGES: usize = 5;

    /// Above this size the adaptive plan switches to sparse sampling (10 MiB)
    pub const MID_MAX_BYTES: u64 = 10 * 1024 * 1024;

    /// Leading pages read for mid-size documents (last page is added)
    pub const MID_PAGES: usize = 4;

    /// Leading pages read by the sparse plan (middle and last page are added)
    pub const SPARSE_FIRST_PAGES: usize = 3;

    /// Default character budget for `char_limit` plans
    pub const DEFAULT_MAX_CHARS: usize = 10_000;

    /// PDFs larger than this are logged as slow to parse
    pub const LARGE_PDF_WARN_BYTES: u64 = 10 * 1024 * 1024;

    /// Extensions handled by the text extractor
    pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text", "csv", "log"];

    /// Extensions handled by the PDF extractor
    pub const PDF_EXTENSIONS: &[&str] = &["pdf"];
}

/// AI boundary constants
pub mod network {
    /// Default request timeout for one AI call (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Default retries after the first attempt
    pub const DEFAULT_MAX_RETRIES: usize = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;

    /// Default maximum tokens generated per answer
    pub const DEFAULT_MAX_TOKENS: usize = 1024;
}

/// Pipeline constants
pub mod pipeline {
    /// Default worker concurrency
    pub const DEFAULT_CONCURRENCY: usize = 4;

    /// Upper bound for configured concurrency
    pub const MAX_CONCURRENCY: usize = 32;

    /// Maximum content characters embedded in a classification prompt
    pub const MAX_PROMPT_CHARS: usize = 12_000;
}

/// Archival path constraints
pub mod naming {
    /// Maximum length of `directory/filename`
    pub const MAX_PATH_LENGTH: usize = 255;

    /// Maximum number of directory segments plus the filename
    pub const MAX_HIERARCHY_DEPTH: usize = 8;

    /// Maximum words kept in a subject slug
    pub const MAX_SUBJECT_WORDS: usize = 3;

    /// Vendor placeholder used when no vendor can be determined
    pub const UNKNOWN_VENDOR: &str = "unknown_vendor";

    /// Vendor values that carry no information
    pub const INVALID_VENDORS: &[&str] = &["unknown", "n/a", "na", "none", "generic", "null"];

    /// Words dropped from subjects
    pub const SUBJECT_STOP_WORDS: &[&str] = &[
        "a", "an", "and", "of", "the", "to", "for", "account", "document",
    ];

    /// Web suffixes stripped from vendor names (longest first)
    pub const VENDOR_WEB_SUFFIXES: &[&str] = &[
        ".co.uk", ".com", ".net", ".org", ".edu", ".gov", ".mil", ".co", ".io", ".ai",
    ];
}

/// Result cache constants
pub mod cache {
    /// Cache database file inside the project directory
    pub const CACHE_DB_FILE: &str = "cache.db";
}
