//! Schema instructions shared by the providers.

use serde_json::Value;

const SYSTEM_ROLE: &str =
    "You are a meticulous records archivist. Always respond with valid JSON.";

/// System message carrying the expected output schema.
pub fn system_prompt(schema: &Value) -> String {
    if schema.is_null() {
        return SYSTEM_ROLE.to_string();
    }

    format!(
        "{}\n\nYour answer must match this JSON schema:\n```json\n{}\n```\n\nRespond ONLY with the JSON object, no explanation.",
        SYSTEM_ROLE,
        pretty(schema)
    )
}

/// Single prompt with the schema appended, for completion-style APIs.
pub fn build_schema_prompt(user_prompt: &str, schema: &Value) -> String {
    if schema.is_null() {
        return user_prompt.to_string();
    }

    format!(
        "{}\n\n---\n\nRespond with valid JSON matching this schema:\n```json\n{}\n```\n\nRespond ONLY with valid JSON, no explanation.",
        user_prompt,
        pretty(schema)
    )
}

fn pretty(schema: &Value) -> String {
    serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_schema() {
        assert_eq!(build_schema_prompt("Classify", &Value::Null), "Classify");
        assert_eq!(system_prompt(&Value::Null), SYSTEM_ROLE);
    }

    #[test]
    fn test_schema_is_embedded() {
        let schema = json!({"type": "object", "required": ["domain"]});
        let prompt = build_schema_prompt("Classify", &schema);
        assert!(prompt.starts_with("Classify"));
        assert!(prompt.contains("\"required\""));

        let system = system_prompt(&schema);
        assert!(system.contains("archivist"));
        assert!(system.contains("\"domain\""));
    }
}
