//! Agent Helper Functions
//!
//! `run_agent` covers the execution pattern every stage shares:
//! 1. Log entry → 2. Call the provider → 3. Parse the answer (or fall back) → 4. Log result

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::ai::LlmProvider;
use crate::types::{ErrorCategory, FilerError, Result, capitalize_first};

// =============================================================================
// Agent Runner Abstraction
// =============================================================================

/// Stage-specific behavior for the generic runner.
pub struct AgentConfig<'a, T> {
    /// Stage name (e.g., "classification", "resolution")
    pub name: &'a str,
    /// Document label for log lines
    pub document: &'a str,
    /// Schema for LLM response validation
    pub schema: serde_json::Value,
    pub prompt: String,
    /// Used when the answer does not match the schema; `None` makes that an error
    pub fallback: Option<Box<dyn Fn() -> T + Send + Sync + 'a>>,
    /// Debug message formatter for logging
    pub debug_result: Box<dyn Fn(&T) -> String + Send + Sync + 'a>,
}

/// Run one stage call against the provider.
///
/// Provider failures always propagate; retries already happened at the
/// provider boundary.
pub async fn run_agent<T>(provider: &dyn LlmProvider, config: AgentConfig<'_, T>) -> Result<T>
where
    T: DeserializeOwned + Send,
{
    let type_name = std::any::type_name::<T>()
        .rsplit("::")
        .next()
        .unwrap_or("Output");
    let label = capitalize_first(config.name);

    debug!(
        "{}Agent: {} ({} prompt chars)",
        label,
        config.document,
        config.prompt.len()
    );

    let response = provider.generate(&config.prompt, &config.schema).await?;

    let output: T = match parse_json_response(&response.content, type_name) {
        Ok(output) => output,
        Err(e) => match &config.fallback {
            Some(fallback) => {
                warn!("{}Agent: Fallback for {}: {}", label, config.document, e);
                fallback()
            }
            None => return Err(e),
        },
    };

    debug!(
        "{}Agent: {} → {}",
        label,
        config.document,
        (config.debug_result)(&output)
    );

    Ok(output)
}

// =============================================================================
// Generic Response Parsing
// =============================================================================

/// Convert a model answer into a typed stage output.
pub fn parse_json_response<T: DeserializeOwned>(
    response: &serde_json::Value,
    type_name: &str,
) -> Result<T> {
    serde_json::from_value::<T>(response.clone()).map_err(|e| {
        FilerError::llm(
            ErrorCategory::InvalidResponse,
            format!("Failed to parse {}: {}", type_name, e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::LlmResponse;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::{Value, json};

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestOutput {
        name: String,
        value: i32,
    }

    struct FixedProvider(Value);

    #[async_trait]
    impl LlmProvider for FixedProvider {
        async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<LlmResponse> {
            Ok(LlmResponse::content_only(self.0.clone()))
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn config<'a>(fallback: bool) -> AgentConfig<'a, TestOutput> {
        AgentConfig {
            name: "test",
            document: "doc.pdf",
            schema: json!({}),
            prompt: "prompt".to_string(),
            fallback: if fallback {
                Some(Box::new(|| TestOutput {
                    name: "fallback".to_string(),
                    value: 0,
                }))
            } else {
                None
            },
            debug_result: Box::new(|o| o.name.clone()),
        }
    }

    #[test]
    fn test_parse_json_response_success() {
        let json = json!({"name": "test", "value": 42});
        let output: TestOutput = parse_json_response(&json, "TestOutput").unwrap();
        assert_eq!(output.value, 42);
    }

    #[test]
    fn test_parse_json_response_failure_is_invalid_response() {
        let err = parse_json_response::<TestOutput>(&json!({"wrong": 1}), "TestOutput").unwrap_err();
        match err {
            FilerError::Llm(e) => assert_eq!(e.category, ErrorCategory::InvalidResponse),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_agent_parses_answer() {
        let provider = FixedProvider(json!({"name": "ok", "value": 1}));
        let output = run_agent(&provider, config(false)).await.unwrap();
        assert_eq!(output.name, "ok");
    }

    #[tokio::test]
    async fn test_run_agent_fallback() {
        let provider = FixedProvider(json!({"unexpected": true}));
        let output = run_agent(&provider, config(true)).await.unwrap();
        assert_eq!(output.name, "fallback");

        assert!(run_agent(&provider, config(false)).await.is_err());
    }
}
