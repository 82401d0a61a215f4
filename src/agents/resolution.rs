//! Conflict Resolution Stage
//!
//! Runs only for flagged documents. The model proposes corrections and
//! alternative placements; every value is re-canonicalized and every path is
//! rebuilt by the path builder, so the stage can never emit a path the
//! builder would not.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::helpers::{AgentConfig, run_agent};
use super::prompts::AgentPrompts;
use super::schemas::AgentSchemas;
use super::standards::{StandardsRules, Standardized, compact_date};
use crate::ai::LlmProvider;
use crate::config::NamingConfig;
use crate::constants::naming::{MAX_SUBJECT_WORDS, UNKNOWN_VENDOR};
use crate::naming::{BuiltPath, build_document_path};
use crate::taxonomy::{Axis, Canonical, LookupContext, normalize_subject, normalize_vendor};
use crate::types::{
    ConflictFlags, FailureKind, FilerError, NormalizedMetadata, RawMetadata, ResolvedMetadata, Result,
};

/// Placement suggested in addition to the final one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub domain: String,
    pub category: String,
    pub doctype: String,
}

/// Model answer for a flagged document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionAnswer {
    pub domain: String,
    pub category: String,
    pub doctype: String,
    pub vendor_name: String,
    pub date: String,
    pub subject: String,
    pub alternative_placements: Vec<Placement>,
    pub addressed_flags: Vec<String>,
    pub resolution_notes: String,
}

/// Final metadata after resolution, with its built path
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub normalized: NormalizedMetadata,
    pub path: BuiltPath,
    pub resolved: ResolvedMetadata,
}

/// Inputs of one resolution pass
pub struct ResolutionRequest<'a> {
    pub document: &'a str,
    pub extension: &'a str,
    pub raw: &'a RawMetadata,
    pub standardized: &'a Standardized,
    pub flags: &'a ConflictFlags,
    /// Path built from the standardized metadata
    pub current: &'a BuiltPath,
}

pub struct ResolutionAgent;

impl ResolutionAgent {
    /// Resolve the flagged conflicts.
    ///
    /// Any failure (provider, invalid correction, unbuildable path) is a
    /// `ConflictResolution` error; the caller keeps the standardized result.
    #[instrument(skip_all, fields(document = request.document, flags = %request.flags))]
    pub async fn resolve(
        provider: &dyn LlmProvider,
        rules: &StandardsRules<'_>,
        naming: &NamingConfig,
        request: ResolutionRequest<'_>,
    ) -> Result<Resolution> {
        let prompt = AgentPrompts::resolution(
            request.document,
            request.raw,
            request.standardized,
            request.flags,
            &request.current.full_path(),
            rules.taxonomy(),
        );

        let answer: ResolutionAnswer = run_agent(
            provider,
            AgentConfig {
                name: "resolution",
                document: request.document,
                schema: AgentSchemas::resolution_schema(),
                prompt,
                fallback: None,
                debug_result: Box::new(|a: &ResolutionAnswer| {
                    format!(
                        "{}/{}/{} vendor={} alternatives={}",
                        a.domain,
                        a.category,
                        a.doctype,
                        a.vendor_name,
                        a.alternative_placements.len()
                    )
                }),
            },
        )
        .await
        .map_err(|e| match e.kind() {
            FailureKind::ConfigurationError => e,
            _ => FilerError::ConflictResolution(e.to_string()),
        })?;

        Self::apply(&answer, rules, naming, &request)
            .map_err(|e| FilerError::ConflictResolution(e.to_string()))
    }

    /// Merge an answer into the standardized metadata and rebuild paths.
    pub fn apply(
        answer: &ResolutionAnswer,
        rules: &StandardsRules<'_>,
        naming: &NamingConfig,
        request: &ResolutionRequest<'_>,
    ) -> Result<Resolution> {
        let base = &request.standardized.normalized;
        let taxonomy = rules.taxonomy();

        let domain = correct(&answer.domain, &base.domain, |v| {
            rules.canonicalize(v, Axis::Domain, LookupContext::none())
        })?;
        let category = correct(&answer.category, &base.category, |v| {
            rules.canonicalize(v, Axis::Category, LookupContext::domain(&domain))
        })?;
        let doctype = correct(&answer.doctype, &base.doctype, |v| {
            rules.canonicalize(v, Axis::Doctype, LookupContext::category(&domain, &category))
        })?;

        let vendor_name = match normalize_vendor(&answer.vendor_name) {
            v if v.is_empty() || v == UNKNOWN_VENDOR => base.vendor_name.clone(),
            v => rules
                .canonicalize(&v, Axis::Vendor, LookupContext::none())?
                .token,
        };

        let date = compact_date(&answer.date).unwrap_or_else(|| base.date.clone());
        let subject = match normalize_subject(&answer.subject, MAX_SUBJECT_WORDS) {
            s if s.is_empty() => base.subject.clone(),
            s => s,
        };

        let normalized = NormalizedMetadata {
            domain,
            category,
            doctype,
            vendor_name,
            date,
            subject,
        };
        let path = build_document_path(&normalized, taxonomy, naming, request.extension)?;
        let final_path = path.full_path();

        let mut alternative_paths = Vec::new();
        for placement in &answer.alternative_placements {
            match Self::alternative(placement, &normalized, rules, naming, request.extension) {
                Ok(alt) if alt != final_path && !alternative_paths.contains(&alt) => {
                    alternative_paths.push(alt)
                }
                Ok(_) => {}
                Err(e) => debug!("dropping alternative placement {:?}: {}", placement, e),
            }
        }

        let resolution_notes = if answer.resolution_notes.trim().is_empty() {
            format!("resolved: {}", request.flags)
        } else {
            answer.resolution_notes.trim().to_string()
        };

        Ok(Resolution {
            normalized,
            path,
            resolved: ResolvedMetadata {
                final_path,
                alternative_paths,
                resolution_notes,
            },
        })
    }

    fn alternative(
        placement: &Placement,
        normalized: &NormalizedMetadata,
        rules: &StandardsRules<'_>,
        naming: &NamingConfig,
        extension: &str,
    ) -> Result<String> {
        let domain = rules
            .canonicalize(&placement.domain, Axis::Domain, LookupContext::none())?
            .token;
        let category = rules
            .canonicalize(&placement.category, Axis::Category, LookupContext::domain(&domain))?
            .token;
        let doctype = rules
            .canonicalize(
                &placement.doctype,
                Axis::Doctype,
                LookupContext::category(&domain, &category),
            )?
            .token;

        let metadata = NormalizedMetadata {
            domain,
            category,
            doctype,
            ..normalized.clone()
        };
        Ok(build_document_path(&metadata, rules.taxonomy(), naming, extension)?.full_path())
    }
}

/// Keep `current` unless a non-empty correction canonicalizes
fn correct<F>(proposed: &str, current: &str, canonicalize: F) -> Result<String>
where
    F: FnOnce(&str) -> Result<Canonical>,
{
    if proposed.trim().is_empty() {
        Ok(current.to_string())
    } else {
        Ok(canonicalize(proposed)?.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::LlmResponse;
    use crate::agents::dates::DateSource;
    use crate::config::{ConflictConfig, ValidationMode};
    use crate::taxonomy::{TaxonomyLoader, TaxonomyVocabulary};
    use crate::types::{ConflictFlag, DateCandidate, ErrorCategory};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct AnswerProvider(Result<Value>);

    #[async_trait]
    impl LlmProvider for AnswerProvider {
        async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<LlmResponse> {
            match &self.0 {
                Ok(v) => Ok(LlmResponse::content_only(v.clone())),
                Err(FilerError::Llm(e)) => Err(FilerError::llm(e.category, e.message.clone())),
                Err(e) => Err(FilerError::ConflictResolution(e.to_string())),
            }
        }

        fn name(&self) -> &str {
            "answer"
        }

        fn model(&self) -> &str {
            "answer"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    struct Fixture {
        taxonomy: TaxonomyVocabulary,
        conflict: ConflictConfig,
        raw: RawMetadata,
        standardized: Standardized,
        flags: ConflictFlags,
        current: BuiltPath,
    }

    impl Fixture {
        fn unknown_vendor() -> Self {
            let taxonomy = TaxonomyLoader::builtin("household").unwrap();
            let normalized = NormalizedMetadata {
                domain: "financial".to_string(),
                category: "banking".to_string(),
                doctype: "statement".to_string(),
                vendor_name: UNKNOWN_VENDOR.to_string(),
                date: "20250131".to_string(),
                subject: "checking".to_string(),
            };
            let current =
                build_document_path(&normalized, &taxonomy, &NamingConfig::default(), "pdf")
                    .unwrap();
            Self {
                taxonomy,
                conflict: ConflictConfig::default(),
                raw: RawMetadata {
                    dates_raw: vec![DateCandidate::new("statement_date", "2025-01-31")],
                    ..Default::default()
                },
                standardized: Standardized {
                    normalized,
                    vendor_matched: false,
                    taxonomy_mismatches: Vec::new(),
                    warnings: Vec::new(),
                    date_source: DateSource::Authoritative("statement_date".to_string()),
                },
                flags: [ConflictFlag::UnknownVendor].into_iter().collect(),
                current,
            }
        }

        fn request(&self) -> ResolutionRequest<'_> {
            ResolutionRequest {
                document: "scan.pdf",
                extension: "pdf",
                raw: &self.raw,
                standardized: &self.standardized,
                flags: &self.flags,
                current: &self.current,
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_vendor_keeps_placeholder() {
        let fixture = Fixture::unknown_vendor();
        let rules = StandardsRules::new(
            &fixture.taxonomy,
            &fixture.conflict,
            ValidationMode::Flexible,
            false,
        );
        let provider = AnswerProvider(Ok(json!({
            "domain": "financial",
            "category": "banking",
            "doctype": "statement",
            "vendor_name": "",
            "date": "",
            "resolution_notes": "Issuer is not printed on the scan."
        })));

        let resolution = ResolutionAgent::resolve(
            &provider,
            &rules,
            &NamingConfig::default(),
            fixture.request(),
        )
        .await
        .unwrap();

        assert_eq!(resolution.normalized.vendor_name, "unknown_vendor");
        assert_eq!(
            resolution.resolved.final_path,
            "Financial/Banking/Statements/statement_unknown_vendor_checking_20250131.pdf"
        );
        assert_eq!(
            resolution.resolved.resolution_notes,
            "Issuer is not printed on the scan."
        );
    }

    #[tokio::test]
    async fn test_contextual_vendor_and_alternatives() {
        let fixture = Fixture::unknown_vendor();
        let rules = StandardsRules::new(
            &fixture.taxonomy,
            &fixture.conflict,
            ValidationMode::Flexible,
            false,
        );
        let provider = AnswerProvider(Ok(json!({
            "domain": "financial",
            "category": "banking",
            "doctype": "statement",
            "vendor_name": "Chase Bank",
            "date": "2025-01-31",
            "alternative_placements": [
                {"domain": "financial", "category": "credit", "doctype": "statement"},
                {"domain": "financial", "category": "banking", "doctype": "statement"},
                {"domain": "astrology", "category": "stars", "doctype": "chart"}
            ],
            "resolution_notes": ""
        })));

        let resolution = ResolutionAgent::resolve(
            &provider,
            &rules,
            &NamingConfig::default(),
            fixture.request(),
        )
        .await
        .unwrap();

        assert_eq!(resolution.normalized.vendor_name, "chase");
        assert_eq!(
            resolution.resolved.alternative_paths,
            vec!["Financial/Credit/Statements/statement_chase_checking_20250131.pdf".to_string()]
        );
        assert_eq!(resolution.resolved.resolution_notes, "resolved: unknown_vendor");
    }

    #[tokio::test]
    async fn test_provider_failure_is_resolution_error() {
        let fixture = Fixture::unknown_vendor();
        let rules = StandardsRules::new(
            &fixture.taxonomy,
            &fixture.conflict,
            ValidationMode::Flexible,
            false,
        );
        let provider = AnswerProvider(Err(FilerError::Cancelled));

        let err = ResolutionAgent::resolve(
            &provider,
            &rules,
            &NamingConfig::default(),
            fixture.request(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FilerError::ConflictResolution(_)));
    }

    #[tokio::test]
    async fn test_rejected_credentials_pass_through() {
        let fixture = Fixture::unknown_vendor();
        let rules = StandardsRules::new(
            &fixture.taxonomy,
            &fixture.conflict,
            ValidationMode::Flexible,
            false,
        );
        let provider = AnswerProvider(Err(FilerError::llm(
            ErrorCategory::Auth,
            "invalid api key",
        )));

        let err = ResolutionAgent::resolve(
            &provider,
            &rules,
            &NamingConfig::default(),
            fixture.request(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FilerError::Llm(_)));
        assert_eq!(err.kind(), FailureKind::ConfigurationError);
    }

    #[test]
    fn test_unknown_domain_correction_fails() {
        let fixture = Fixture::unknown_vendor();
        let rules = StandardsRules::new(
            &fixture.taxonomy,
            &fixture.conflict,
            ValidationMode::Flexible,
            false,
        );
        let answer = ResolutionAnswer {
            domain: "astrology".to_string(),
            ..Default::default()
        };
        let result =
            ResolutionAgent::apply(&answer, &rules, &NamingConfig::default(), &fixture.request());
        assert!(result.is_err());
    }
}
