//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/docfiler/) and project (.docfiler/) level configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::constants::{extraction as ext, network as net, pipeline as pipe};
use crate::types::{FilerError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Controlled vocabulary selection and strictness
    pub taxonomy: TaxonomyConfig,

    /// Archival path shape
    pub naming: NamingConfig,

    /// Content sampling before classification
    pub extraction: ExtractionConfig,

    /// Conflict detection thresholds
    pub conflict: ConflictConfig,

    /// Batch execution settings
    pub pipeline: PipelineConfig,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Result output settings
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            taxonomy: TaxonomyConfig::default(),
            naming: NamingConfig::default(),
            extraction: ExtractionConfig::default(),
            conflict: ConflictConfig::default(),
            pipeline: PipelineConfig::default(),
            llm: LlmConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `FilerError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(FilerError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(FilerError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.llm.provider.as_str(), "openai" | "ollama") {
            return Err(FilerError::Config(format!(
                "Unknown LLM provider: {}. Supported: openai, ollama",
                self.llm.provider
            )));
        }

        if self.pipeline.concurrency == 0 || self.pipeline.concurrency > pipe::MAX_CONCURRENCY {
            return Err(FilerError::Config(format!(
                "pipeline.concurrency must be between 1 and {}, got {}",
                pipe::MAX_CONCURRENCY,
                self.pipeline.concurrency
            )));
        }

        self.extraction.validate()?;

        if self.conflict.date_tolerance_days < 0 {
            return Err(FilerError::Config(
                "conflict.date_tolerance_days must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Implements `Display` and `FromStr` for a unit-only config enum.
macro_rules! config_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($name::$variant => write!(f, $text),)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().replace('-', "_").as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!(
                        concat!("Unknown ", $label, ": {}. Valid values: {}"),
                        s,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

// =============================================================================
// Taxonomy Configuration
// =============================================================================

/// How unknown taxonomy values are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Unknown category/doctype/vendor is an error
    Strict,
    /// Unknown values become synthesized slugs with a warning
    #[default]
    Flexible,
}

config_enum!(ValidationMode, "validation mode", {
    Strict => "strict",
    Flexible => "flexible",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Built-in taxonomy name
    pub name: String,

    /// YAML taxonomy file (overrides `name`)
    pub path: Option<PathBuf>,

    /// Strictness for category/doctype/vendor (domain is always strict)
    pub mode: ValidationMode,

    /// In strict mode, report unknown values as conflicts instead of failing
    pub dry_validation: bool,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            name: "household".to_string(),
            path: None,
            mode: ValidationMode::Flexible,
            dry_validation: false,
        }
    }
}

// =============================================================================
// Naming Configuration
// =============================================================================

/// Filename convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NamingStyle {
    /// `doctype_vendor[_subject][_date][_suffix].ext`
    #[default]
    Descriptive,
    /// `vendor[_date].ext`
    Compact,
}

config_enum!(NamingStyle, "naming style", {
    Descriptive => "descriptive",
    Compact => "compact",
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub style: NamingStyle,

    /// Append `_q1`..`_q4` to descriptive filenames
    pub quarterly: bool,
}

// =============================================================================
// Extraction Configuration
// =============================================================================

/// Configured sampling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Decide from document size and page count
    #[default]
    Adaptive,
    Full,
    FirstPages,
    CharLimit,
}

config_enum!(ExtractionStrategy, "extraction strategy", {
    Adaptive => "adaptive",
    Full => "full",
    FirstPages => "first_pages",
    CharLimit => "char_limit",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub strategy: ExtractionStrategy,

    /// Leading pages for the `first_pages` strategy
    pub pages: usize,

    /// Also read the last page for the `first_pages` strategy
    pub include_last: bool,

    /// Character budget for `char_limit` (also the budget for large text files)
    pub max_chars: usize,

    // Adaptive thresholds
    pub small_max_bytes: u64,
    pub small_max_pages: usize,
    pub mid_max_bytes: u64,
    pub mid_pages: usize,
    pub sparse_first_pages: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::Adaptive,
            pages: 3,
            include_last: true,
            max_chars: ext::DEFAULT_MAX_CHARS,
            small_max_bytes: ext::SMALL_MAX_BYTES,
            small_max_pages: ext::SMALL_MAX_PAGES,
            mid_max_bytes: ext::MID_MAX_BYTES,
            mid_pages: ext::MID_PAGES,
            sparse_first_pages: ext::SPARSE_FIRST_PAGES,
        }
    }
}

impl ExtractionConfig {
    fn validate(&self) -> Result<()> {
        if self.small_max_bytes > self.mid_max_bytes {
            return Err(FilerError::Config(format!(
                "extraction.small_max_bytes ({}) must not exceed mid_max_bytes ({})",
                self.small_max_bytes, self.mid_max_bytes
            )));
        }
        if self.pages == 0 || self.mid_pages == 0 || self.sparse_first_pages == 0 {
            return Err(FilerError::Config(
                "extraction page counts must be greater than 0".to_string(),
            ));
        }
        // Adaptive coverage must not grow with document size
        if self.sparse_first_pages + 2 > self.mid_pages + 1 {
            return Err(FilerError::Config(format!(
                "extraction.sparse_first_pages ({}) plus middle and last page must not \
                 exceed mid_pages ({}) plus last page",
                self.sparse_first_pages, self.mid_pages
            )));
        }
        if self.max_chars == 0 {
            return Err(FilerError::Config(
                "extraction.max_chars must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Conflict Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Dates closer than this many days do not disagree
    pub date_tolerance_days: i64,

    /// Doctype → authoritative date labels, most preferred first
    pub date_precedence: BTreeMap<String, Vec<String>>,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            date_tolerance_days: 0,
            date_precedence: default_date_precedence(),
        }
    }
}

impl ConflictConfig {
    /// Authoritative labels for a doctype (empty when none are configured)
    pub fn authoritative_labels(&self, doctype: &str) -> &[String] {
        self.date_precedence
            .get(doctype)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn default_date_precedence() -> BTreeMap<String, Vec<String>> {
    let transaction = &["transaction_date", "invoice_date", "purchase_date", "service_date"][..];
    let period_end = &["period_end_date", "statement_date", "closing_date", "report_date"][..];
    let effective = &["effective_date", "start_date", "signed_date"][..];
    let filing = &["filing_date", "signed_date", "tax_year"][..];

    let table: &[(&str, &[&str])] = &[
        ("receipt", transaction),
        ("invoice", transaction),
        ("bill", transaction),
        ("statement", period_end),
        ("report", period_end),
        ("contract", effective),
        ("policy", effective),
        ("agreement", effective),
        ("form", filing),
    ];

    table
        .iter()
        .map(|(doctype, labels)| {
            (
                doctype.to_string(),
                labels.iter().map(|l| l.to_string()).collect(),
            )
        })
        .collect()
}

// =============================================================================
// Pipeline Configuration
// =============================================================================

/// How the standards stage normalizes raw metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StandardsMode {
    /// Deterministic rules only
    #[default]
    Rules,
    /// Model proposal followed by the deterministic rules
    Ai,
}

config_enum!(StandardsMode, "standards mode", {
    Rules => "rules",
    Ai => "ai",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Documents processed concurrently
    pub concurrency: usize,

    /// Reuse results for unchanged documents
    pub cache: bool,

    pub standards: StandardsMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: pipe::DEFAULT_CONCURRENCY,
            cache: true,
            standards: StandardsMode::Rules,
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "openai" or "ollama"
    pub provider: String,

    /// Model name (provider default when unset)
    pub model: Option<String>,

    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for LLM generation (0.0 = deterministic)
    pub temperature: f32,

    /// Maximum tokens generated per answer
    pub max_tokens: usize,

    /// Retries after the first attempt for transient failures
    pub max_retries: usize,

    /// Custom endpoint
    pub api_base: Option<String>,

    /// Never serialized to output
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: net::DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
            max_tokens: net::DEFAULT_MAX_TOKENS,
            max_retries: net::DEFAULT_MAX_RETRIES,
            api_base: None,
            api_key: None,
        }
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

/// Result record format on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    Csv,
    Tsv,
}

config_enum!(OutputFormat, "output format", {
    Json => "json",
    Csv => "csv",
    Tsv => "tsv",
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.taxonomy.name, "household");
        assert_eq!(config.naming.style, NamingStyle::Descriptive);
        assert_eq!(config.pipeline.concurrency, 4);
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("compact".parse::<NamingStyle>().unwrap(), NamingStyle::Compact);
        assert_eq!(
            "first-pages".parse::<ExtractionStrategy>().unwrap(),
            ExtractionStrategy::FirstPages
        );
        assert_eq!("STRICT".parse::<ValidationMode>().unwrap(), ValidationMode::Strict);
        assert_eq!("tsv".parse::<OutputFormat>().unwrap(), OutputFormat::Tsv);

        let err = "nara".parse::<NamingStyle>().unwrap_err();
        assert!(err.contains("descriptive, compact"));
    }

    #[test]
    fn test_enum_display_round_trip() {
        for strategy in [
            ExtractionStrategy::Adaptive,
            ExtractionStrategy::Full,
            ExtractionStrategy::FirstPages,
            ExtractionStrategy::CharLimit,
        ] {
            assert_eq!(strategy.to_string().parse::<ExtractionStrategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.pipeline.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.provider = "claude".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extraction.small_max_bytes = config.extraction.mid_max_bytes + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extraction.sparse_first_pages = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_date_precedence_defaults() {
        let conflict = ConflictConfig::default();
        assert!(
            conflict
                .authoritative_labels("statement")
                .contains(&"statement_date".to_string())
        );
        assert_eq!(conflict.authoritative_labels("receipt")[0], "transaction_date");
        assert!(conflict.authoritative_labels("manual").is_empty());
    }

    #[test]
    fn test_api_key_is_redacted_and_not_serialized() {
        let llm = LlmConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", llm).contains("sk-secret"));
        let json = serde_json::to_string(&llm).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
