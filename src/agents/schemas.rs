//! JSON Schemas for Stage Outputs
//!
//! Every object sets `additionalProperties: false`, lists its required
//! fields and describes each property so the model has no room to invent
//! keys.

use serde_json::json;

use crate::types::ConflictFlag;

pub struct AgentSchemas;

impl AgentSchemas {
    fn date_candidates() -> serde_json::Value {
        json!({
            "type": "array",
            "description": "Every date printed in the document, in reading order",
            "items": {
                "type": "object",
                "required": ["label", "value"],
                "additionalProperties": false,
                "properties": {
                    "label": {
                        "type": "string",
                        "description": "What the date means (statement_date, transaction_date, due_date, received_date, effective_date, filing_date, ...)"
                    },
                    "value": {"type": "string", "description": "The date exactly as printed"}
                }
            }
        })
    }

    /// Raw metadata produced by the classification stage
    pub fn classification_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "description": "Unnormalized classification of one document",
            "required": ["domain", "category", "doctype", "vendor_raw", "dates_raw", "subject_raw", "multi_purpose"],
            "additionalProperties": false,
            "properties": {
                "domain": {"type": "string", "description": "Top-level domain from the taxonomy"},
                "category": {"type": "string", "description": "Category within the domain"},
                "doctype": {"type": "string", "description": "Kind of document (statement, receipt, policy, ...)"},
                "vendor_raw": {
                    "type": "string",
                    "description": "Issuing organization as printed, empty when none is identifiable"
                },
                "dates_raw": Self::date_candidates(),
                "subject_raw": {"type": "string", "description": "Short phrase describing what the document is about"},
                "multi_purpose": {
                    "type": "boolean",
                    "description": "True when the document plausibly belongs under more than one domain or category"
                },
                "account_types": {
                    "type": "array",
                    "description": "Account kinds mentioned (checking, savings, brokerage, ...)",
                    "items": {"type": "string"}
                }
            }
        })
    }

    /// Normalization proposal produced by the standards stage in AI mode
    pub fn standards_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "description": "Canonical values proposed for one document",
            "required": ["domain", "category", "doctype", "vendor_name", "date", "subject"],
            "additionalProperties": false,
            "properties": {
                "domain": {"type": "string", "description": "Canonical domain token"},
                "category": {"type": "string", "description": "Canonical category token"},
                "doctype": {"type": "string", "description": "Canonical doctype token"},
                "vendor_name": {
                    "type": "string",
                    "description": "Vendor slug (lowercase, underscores), empty when unknown"
                },
                "date": {
                    "type": "string",
                    "description": "Single most relevant date as YYYYMMDD, YYYYMM or YYYY, empty when unknown"
                },
                "subject": {"type": "string", "description": "One to three word lowercase slug"}
            }
        })
    }

    /// Corrections produced by the conflict resolution stage
    pub fn resolution_schema() -> serde_json::Value {
        let flags: Vec<&str> = [
            ConflictFlag::MultipleDates,
            ConflictFlag::UnknownVendor,
            ConflictFlag::MultiPurposeDocument,
            ConflictFlag::TaxonomyMismatch,
        ]
        .iter()
        .map(ConflictFlag::as_str)
        .collect();

        json!({
            "type": "object",
            "description": "Final decision for a document whose metadata was flagged as ambiguous",
            "required": ["domain", "category", "doctype", "vendor_name", "date", "resolution_notes"],
            "additionalProperties": false,
            "properties": {
                "domain": {"type": "string", "description": "Final domain token"},
                "category": {"type": "string", "description": "Final category token"},
                "doctype": {"type": "string", "description": "Final doctype token"},
                "vendor_name": {
                    "type": "string",
                    "description": "Final vendor slug; use unknown_vendor when the issuer cannot be determined"
                },
                "date": {"type": "string", "description": "Final date as YYYYMMDD, YYYYMM or YYYY"},
                "subject": {"type": "string", "description": "Final subject slug, may be empty"},
                "alternative_placements": {
                    "type": "array",
                    "description": "Other plausible placements, most likely first",
                    "items": {
                        "type": "object",
                        "required": ["domain", "category", "doctype"],
                        "additionalProperties": false,
                        "properties": {
                            "domain": {"type": "string"},
                            "category": {"type": "string"},
                            "doctype": {"type": "string"}
                        }
                    }
                },
                "addressed_flags": {
                    "type": "array",
                    "description": "Conflict flags this answer resolves",
                    "items": {"type": "string", "enum": flags}
                },
                "resolution_notes": {"type": "string", "description": "One or two sentences explaining the decision"}
            }
        })
    }
}
