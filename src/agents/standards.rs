//! Standards Stage
//!
//! Turns raw metadata into canonical tokens. The deterministic rules always
//! have the last word: in AI mode the model only proposes values, which then
//! go through the same canonicalization as raw classification output.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::dates::{DateSource, parse_date, select_date};
use super::helpers::{AgentConfig, run_agent};
use super::prompts::AgentPrompts;
use super::schemas::AgentSchemas;
use crate::ai::LlmProvider;
use crate::config::{ConflictConfig, ValidationMode};
use crate::constants::naming::{MAX_SUBJECT_WORDS, UNKNOWN_VENDOR};
use crate::taxonomy::{
    Axis, Canonical, LookupContext, TaxonomyVocabulary, normalize_subject, normalize_vendor,
};
use crate::types::{FilerError, NormalizedMetadata, RawMetadata, Result};

/// Normalized metadata plus what the conflict detector needs to know about
/// how it was derived
#[derive(Debug, Clone, PartialEq)]
pub struct Standardized {
    pub normalized: NormalizedMetadata,
    /// False when the vendor was synthesized or missing
    pub vendor_matched: bool,
    /// Axes that failed strict validation without failing the document
    pub taxonomy_mismatches: Vec<String>,
    pub warnings: Vec<String>,
    pub date_source: DateSource,
}

/// Values proposed by the model in AI mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardsProposal {
    pub domain: String,
    pub category: String,
    pub doctype: String,
    pub vendor_name: String,
    pub date: String,
    pub subject: String,
}

// =============================================================================
// Deterministic Rules
// =============================================================================

pub struct StandardsRules<'a> {
    taxonomy: &'a TaxonomyVocabulary,
    conflict: &'a ConflictConfig,
    mode: ValidationMode,
    dry_validation: bool,
}

impl<'a> StandardsRules<'a> {
    pub fn new(
        taxonomy: &'a TaxonomyVocabulary,
        conflict: &'a ConflictConfig,
        mode: ValidationMode,
        dry_validation: bool,
    ) -> Self {
        Self {
            taxonomy,
            conflict,
            mode,
            dry_validation,
        }
    }

    pub fn taxonomy(&self) -> &TaxonomyVocabulary {
        self.taxonomy
    }

    /// Normalize raw classification output.
    ///
    /// Fails with `UnknownTaxonomyValue` for an unknown domain, and for any
    /// unknown value in strict mode unless dry validation is on.
    pub fn apply(&self, raw: &RawMetadata) -> Result<Standardized> {
        let mut out = Standardized {
            normalized: NormalizedMetadata::default(),
            vendor_matched: true,
            taxonomy_mismatches: Vec::new(),
            warnings: Vec::new(),
            date_source: DateSource::None,
        };

        let domain = self.resolve(&raw.domain, Axis::Domain, LookupContext::none(), &mut out)?;
        let category = self.resolve(
            &raw.category,
            Axis::Category,
            LookupContext::domain(&domain),
            &mut out,
        )?;
        let doctype = self.resolve(
            &raw.doctype,
            Axis::Doctype,
            LookupContext::category(&domain, &category),
            &mut out,
        )?;

        let vendor = normalize_vendor(&raw.vendor_raw);
        let vendor_name = if vendor.is_empty() {
            out.vendor_matched = false;
            UNKNOWN_VENDOR.to_string()
        } else {
            let before = out.taxonomy_mismatches.len();
            let token = self.resolve(&vendor, Axis::Vendor, LookupContext::none(), &mut out)?;
            if out.taxonomy_mismatches.len() > before {
                out.vendor_matched = false;
            }
            token
        };

        let selection = select_date(&raw.dates_raw, &doctype, self.conflict);
        if selection.source == DateSource::MostRecent && raw.dates_raw.len() > 1 {
            out.warnings.push(format!(
                "no authoritative date for '{}', using most recent candidate",
                doctype
            ));
        }
        out.date_source = selection.source;

        out.normalized = NormalizedMetadata {
            domain,
            category,
            doctype,
            vendor_name,
            date: selection.date.map(|d| d.compact()).unwrap_or_default(),
            subject: normalize_subject(&raw.subject_raw, MAX_SUBJECT_WORDS),
        };
        Ok(out)
    }

    /// Apply a model proposal: proposed values replace raw ones where
    /// present, then the rules run as usual.
    pub fn apply_proposal(
        &self,
        raw: &RawMetadata,
        proposal: &StandardsProposal,
    ) -> Result<Standardized> {
        let pick = |proposed: &str, original: &str| {
            if proposed.trim().is_empty() {
                original.to_string()
            } else {
                proposed.to_string()
            }
        };

        let merged = RawMetadata {
            domain: pick(&proposal.domain, &raw.domain),
            category: pick(&proposal.category, &raw.category),
            doctype: pick(&proposal.doctype, &raw.doctype),
            vendor_raw: pick(&proposal.vendor_name, &raw.vendor_raw),
            subject_raw: pick(&proposal.subject, &raw.subject_raw),
            ..raw.clone()
        };

        let mut standardized = self.apply(&merged)?;

        // An authoritative raw date outranks the model's choice
        if !matches!(standardized.date_source, DateSource::Authoritative(_))
            && let Some(date) = parse_date(&proposal.date)
        {
            standardized.normalized.date = date.compact();
        }

        Ok(standardized)
    }

    /// Canonicalize a single value on `axis` with the configured strictness.
    pub fn canonicalize(
        &self,
        raw: &str,
        axis: Axis,
        ctx: LookupContext<'_>,
    ) -> Result<Canonical> {
        self.taxonomy.canonicalize(raw, axis, &ctx, self.mode)
    }

    fn resolve(
        &self,
        raw: &str,
        axis: Axis,
        ctx: LookupContext<'_>,
        out: &mut Standardized,
    ) -> Result<String> {
        match self.canonicalize(raw, axis, ctx) {
            Ok(canonical) => {
                if axis == Axis::Vendor && !canonical.matched {
                    out.vendor_matched = false;
                }
                out.warnings.extend(canonical.warning);
                Ok(canonical.token)
            }
            Err(FilerError::UnknownTaxonomyValue { .. })
                if axis != Axis::Domain && self.dry_validation =>
            {
                let canonical =
                    self.taxonomy
                        .canonicalize(raw, axis, &ctx, ValidationMode::Flexible)?;
                warn!("{} '{}' does not validate strictly", axis, raw);
                out.taxonomy_mismatches.push(axis.to_string());
                out.warnings.extend(canonical.warning);
                Ok(canonical.token)
            }
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// Standards Agent
// =============================================================================

pub struct StandardsAgent;

impl StandardsAgent {
    /// Ask the model for canonical values, then validate them with the rules.
    #[instrument(skip_all, fields(document = document))]
    pub async fn standardize(
        provider: &dyn LlmProvider,
        rules: &StandardsRules<'_>,
        document: &str,
        raw: &RawMetadata,
    ) -> Result<Standardized> {
        let proposal: StandardsProposal = run_agent(
            provider,
            AgentConfig {
                name: "standards",
                document,
                schema: AgentSchemas::standards_schema(),
                prompt: AgentPrompts::standards(raw, rules.taxonomy()),
                fallback: Some(Box::new(StandardsProposal::default)),
                debug_result: Box::new(|p: &StandardsProposal| {
                    format!("{}/{}/{} vendor={}", p.domain, p.category, p.doctype, p.vendor_name)
                }),
            },
        )
        .await?;

        let standardized = rules.apply_proposal(raw, &proposal)?;
        debug!("standardized {}: {:?}", document, standardized.normalized);
        Ok(standardized)
    }
}

/// Parsed date helper for callers outside the stage
pub fn compact_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|d| d.compact())
}
