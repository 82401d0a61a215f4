//! Stage prompts.

use crate::ai::PromptBuilder;
use crate::constants::pipeline::MAX_PROMPT_CHARS;
use crate::extraction::ExtractedContent;
use crate::taxonomy::TaxonomyVocabulary;
use crate::types::{ConflictFlag, ConflictFlags, RawMetadata};

use super::standards::Standardized;

pub struct AgentPrompts;

impl AgentPrompts {
    pub fn classification(
        document: &str,
        content: &ExtractedContent,
        taxonomy: &TaxonomyVocabulary,
    ) -> String {
        PromptBuilder::new()
            .role("records archivist", "classifying household and business documents")
            .objectives(vec![
                "Pick the domain, category and doctype that best describe the document",
                "Identify the issuing organization exactly as printed",
                "List every date with a label describing what it means",
                "Summarize the subject in a short phrase",
                "Say whether the document plausibly belongs in more than one place",
            ])
            .context_item("File", document)
            .context_item("Sampling", &content.plan.to_string())
            .context_item("Pages read", &content.pages_read.to_string())
            .context_item("Truncated", if content.truncated { "yes" } else { "no" })
            .section("Taxonomy", &taxonomy.to_prompt_xml())
            .block("document", &content.text, MAX_PROMPT_CHARS)
            .rules(vec![
                "Prefer values from the taxonomy; invent a value only when nothing fits",
                "Leave vendor_raw empty when no issuer is identifiable",
                "Copy dates exactly as printed; do not reformat them",
                "Label dates by meaning: statement_date, period_end_date, transaction_date, invoice_date, due_date, effective_date, filing_date, received_date",
            ])
            .anti_patterns(
                vec![
                    "dates_raw: [{\"label\": \"date\", \"value\": \"2025-01-31\"}]",
                    "vendor_raw: \"Unknown\"",
                ],
                vec![
                    "dates_raw: [{\"label\": \"statement_date\", \"value\": \"January 31, 2025\"}]",
                    "vendor_raw: \"\"",
                ],
            )
            .build()
    }

    pub fn standards(raw: &RawMetadata, taxonomy: &TaxonomyVocabulary) -> String {
        PromptBuilder::new()
            .role("records archivist", "normalizing document metadata to canonical tokens")
            .objectives(vec![
                "Map domain, category and doctype onto the taxonomy",
                "Reduce the vendor to a short lowercase slug",
                "Choose the single most relevant date and write it as YYYYMMDD, YYYYMM or YYYY",
                "Reduce the subject to at most three words",
            ])
            .section("Taxonomy", &taxonomy.to_prompt_xml())
            .section("Raw Metadata", &pretty(raw))
            .anti_patterns(
                vec!["vendor_name: \"Chase Bank, N.A.\"", "date: \"2025-01\" for a dated statement"],
                vec!["vendor_name: \"chase\"", "date: \"20250131\""],
            )
            .build()
    }

    pub fn resolution(
        document: &str,
        raw: &RawMetadata,
        standardized: &Standardized,
        flags: &ConflictFlags,
        current_path: &str,
        taxonomy: &TaxonomyVocabulary,
    ) -> String {
        let mut builder = PromptBuilder::new()
            .role("records archivist", "resolving ambiguous document metadata")
            .objectives(vec![
                "Address every listed conflict in one answer",
                "Keep values that are not in conflict unchanged",
                "Offer alternative placements only when they are genuinely plausible",
            ])
            .context_item("File", document)
            .context_item("Conflicts", &flags.to_string())
            .context_item("Current path", current_path);

        for flag in flags.iter() {
            let guidance = match flag {
                ConflictFlag::MultipleDates => {
                    "multiple_dates: pick the date that best identifies the document period or event"
                }
                ConflictFlag::UnknownVendor => {
                    "unknown_vendor: name the issuer if the content reveals it, otherwise use unknown_vendor"
                }
                ConflictFlag::MultiPurposeDocument => {
                    "multi_purpose_document: choose the primary placement and list the others as alternatives"
                }
                ConflictFlag::TaxonomyMismatch => {
                    "taxonomy_mismatch: replace out-of-vocabulary values with the closest taxonomy entry"
                }
            };
            builder = builder.text(guidance);
        }

        builder
            .section("Taxonomy", &taxonomy.to_prompt_xml())
            .section("Raw Metadata", &pretty(raw))
            .section("Normalized Metadata", &pretty(&standardized.normalized))
            .build()
    }
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
