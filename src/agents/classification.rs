//! Classification Stage
//!
//! Sends the sampled document content plus the taxonomy to the model and
//! returns raw, unnormalized metadata.

use tracing::instrument;

use super::helpers::{AgentConfig, run_agent};
use super::prompts::AgentPrompts;
use super::schemas::AgentSchemas;
use crate::ai::LlmProvider;
use crate::extraction::ExtractedContent;
use crate::taxonomy::TaxonomyVocabulary;
use crate::types::{RawMetadata, Result};

pub struct ClassificationAgent;

impl ClassificationAgent {
    /// Classify one document. An answer that does not match the schema is
    /// an AI invocation failure; there is no meaningful fallback.
    #[instrument(skip_all, fields(document = document, plan = %content.plan))]
    pub async fn classify(
        provider: &dyn LlmProvider,
        taxonomy: &TaxonomyVocabulary,
        document: &str,
        content: &ExtractedContent,
    ) -> Result<RawMetadata> {
        let raw: RawMetadata = run_agent(
            provider,
            AgentConfig {
                name: "classification",
                document,
                schema: AgentSchemas::classification_schema(),
                prompt: AgentPrompts::classification(document, content, taxonomy),
                fallback: None,
                debug_result: Box::new(|r: &RawMetadata| {
                    format!(
                        "{}/{}/{} vendor='{}' dates={}",
                        r.domain,
                        r.category,
                        r.doctype,
                        r.vendor_raw,
                        r.dates_raw.len()
                    )
                }),
            },
        )
        .await?;

        Ok(tidy(raw))
    }
}

/// Trim whitespace and drop date candidates without a value
fn tidy(mut raw: RawMetadata) -> RawMetadata {
    for field in [
        &mut raw.domain,
        &mut raw.category,
        &mut raw.doctype,
        &mut raw.vendor_raw,
        &mut raw.subject_raw,
    ] {
        *field = field.trim().to_string();
    }
    raw.dates_raw.retain(|c| !c.value.trim().is_empty());
    for candidate in &mut raw.dates_raw {
        candidate.label = candidate.label.trim().to_string();
        candidate.value = candidate.value.trim().to_string();
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::LlmResponse;
    use crate::extraction::SamplingPlan;
    use crate::taxonomy::TaxonomyLoader;
    use crate::types::DateCandidate;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    struct RecordingProvider {
        answer: Value,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        async fn generate(&self, prompt: &str, _schema: &Value) -> Result<LlmResponse> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(LlmResponse::content_only(self.answer.clone()))
        }

        fn name(&self) -> &str {
            "recording"
        }

        fn model(&self) -> &str {
            "recording"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn content() -> ExtractedContent {
        ExtractedContent {
            text: "Chase checking statement, period ending January 31, 2025".to_string(),
            plan: SamplingPlan::Full,
            pages_read: 1,
            truncated: false,
        }
    }

    #[tokio::test]
    async fn test_classify_tidies_answer() {
        let provider = RecordingProvider {
            answer: json!({
                "domain": " financial ",
                "category": "banking",
                "doctype": "statement",
                "vendor_raw": "Chase Bank ",
                "dates_raw": [
                    {"label": "statement_date", "value": "2025-01-31"},
                    {"label": "due_date", "value": "  "}
                ],
                "subject_raw": "checking account",
                "multi_purpose": false
            }),
            prompts: Mutex::new(Vec::new()),
        };
        let taxonomy = TaxonomyLoader::builtin("household").unwrap();

        let raw = ClassificationAgent::classify(&provider, &taxonomy, "jan.pdf", &content())
            .await
            .unwrap();
        assert_eq!(raw.domain, "financial");
        assert_eq!(raw.vendor_raw, "Chase Bank");
        assert_eq!(
            raw.dates_raw,
            vec![DateCandidate::new("statement_date", "2025-01-31")]
        );

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("period ending January 31, 2025"));
    }

    #[tokio::test]
    async fn test_classify_rejects_non_object() {
        let provider = RecordingProvider {
            answer: json!(["not", "an", "object"]),
            prompts: Mutex::new(Vec::new()),
        };
        let taxonomy = TaxonomyLoader::builtin("household").unwrap();

        let result = ClassificationAgent::classify(&provider, &taxonomy, "x.pdf", &content()).await;
        assert!(result.is_err());
    }
}
