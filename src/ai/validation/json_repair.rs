//! JSON repair for model answers.
//!
//! Models wrap JSON in code fences, add prose around it, leave trailing
//! commas or stop mid-object when they hit the token limit. Repairs are
//! applied in increasing order of aggressiveness; the first variant that
//! parses wins.

use serde_json::Value;
use tracing::debug;

use crate::types::{ErrorCategory, FilerError, Result};

/// Parse a model answer into JSON, repairing it when needed
pub fn extract_json_from_response(content: &str) -> Result<Value> {
    JsonRepairer::new().parse_or_repair(content).map(|(value, _)| value)
}

/// String-aware character walk shared by the repair passes
struct Scanner {
    in_string: bool,
    escape: bool,
}

impl Scanner {
    fn new() -> Self {
        Self {
            in_string: false,
            escape: false,
        }
    }

    /// Feed one character; returns true when it is structural (outside a string)
    fn structural(&mut self, ch: char) -> bool {
        if self.escape {
            self.escape = false;
            return false;
        }
        match ch {
            '\\' if self.in_string => {
                self.escape = true;
                false
            }
            '"' => {
                self.in_string = !self.in_string;
                false
            }
            _ => !self.in_string,
        }
    }
}

#[derive(Debug, Default)]
pub struct JsonRepairer;

impl JsonRepairer {
    pub fn new() -> Self {
        Self
    }

    /// Returns the parsed value and whether any repair was needed
    pub fn parse_or_repair(&self, raw: &str) -> Result<(Value, bool)> {
        let cleaned = Self::preprocess(raw);

        if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
            return Ok((value, false));
        }

        let embedded = Self::extract_embedded(&cleaned);
        let candidates = [
            embedded.clone(),
            Some(Self::close_structures(&Self::drop_trailing_commas(&cleaned))),
            Some(Self::close_structures(&Self::drop_trailing_commas(
                &Self::close_broken_strings(&Self::strip_control_chars(&cleaned)),
            ))),
            embedded.map(|e| Self::close_structures(&Self::drop_trailing_commas(&e))),
        ];

        for (level, candidate) in candidates.into_iter().flatten().enumerate() {
            if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
                debug!("Model JSON repaired (pass {})", level + 1);
                return Ok((value, true));
            }
        }

        Err(FilerError::llm(
            ErrorCategory::InvalidResponse,
            format!(
                "Model answer is not valid JSON: {}...",
                cleaned.chars().take(200).collect::<String>()
            ),
        ))
    }

    fn preprocess(raw: &str) -> String {
        let trimmed = raw.trim().trim_start_matches('\u{feff}');
        let mut s = trimmed;

        if s.starts_with("```")
            && let Some(newline) = s.find('\n')
        {
            s = &s[newline + 1..];
        }
        if let Some(stripped) = s.trim_end().strip_suffix("```") {
            s = stripped;
        }

        s.trim().to_string()
    }

    /// First balanced object or array found in surrounding prose
    fn extract_embedded(s: &str) -> Option<String> {
        let start = s.find(['{', '['])?;
        let mut scanner = Scanner::new();
        let mut depth = 0i32;

        for (i, ch) in s[start..].char_indices() {
            if !scanner.structural(ch) {
                continue;
            }
            match ch {
                '{' | '[' => depth += 1,
                '}' | ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(s[start..start + i + 1].to_string());
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn drop_trailing_commas(s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut scanner = Scanner::new();
        let mut out = String::with_capacity(s.len());

        for (i, &ch) in chars.iter().enumerate() {
            if scanner.structural(ch) && ch == ',' {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some('}') | Some(']') | None) {
                    continue;
                }
            }
            out.push(ch);
        }
        out
    }

    /// Close an unterminated string and any open objects/arrays, innermost first
    fn close_structures(s: &str) -> String {
        let mut scanner = Scanner::new();
        let mut open: Vec<char> = Vec::new();

        for ch in s.chars() {
            if !scanner.structural(ch) {
                continue;
            }
            match ch {
                '{' => open.push('}'),
                '[' => open.push(']'),
                '}' | ']' => {
                    open.pop();
                }
                _ => {}
            }
        }

        let mut out = s.trim_end().to_string();
        if scanner.in_string {
            out.push('"');
        }
        let trimmed_len = out.trim_end_matches([',', ' ', '\n', '\r', '\t']).len();
        out.truncate(trimmed_len);
        while let Some(closer) = open.pop() {
            out.push(closer);
        }
        out
    }

    /// Close strings that run into a line break
    fn close_broken_strings(s: &str) -> String {
        let mut scanner = Scanner::new();
        let mut out = String::with_capacity(s.len() + 8);

        for ch in s.chars() {
            if (ch == '\n' || ch == '\r') && scanner.in_string && !scanner.escape {
                out.push('"');
                scanner.in_string = false;
            } else {
                scanner.structural(ch);
            }
            out.push(ch);
        }
        out
    }

    fn strip_control_chars(s: &str) -> String {
        s.chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json_is_not_repaired() {
        let (value, repaired) = JsonRepairer::new()
            .parse_or_repair(r#"{"domain": "financial"}"#)
            .unwrap();
        assert_eq!(value["domain"], "financial");
        assert!(!repaired);
    }

    #[test]
    fn test_code_fences() {
        let input = "```json\n{\"doctype\": \"statement\"}\n```";
        let (value, repaired) = JsonRepairer::new().parse_or_repair(input).unwrap();
        assert_eq!(value["doctype"], "statement");
        assert!(!repaired);
    }

    #[test]
    fn test_trailing_comma() {
        let input = r#"{"dates_raw": [{"label": "statement_date", "value": "2025-01-31"},],}"#;
        let (value, repaired) = JsonRepairer::new().parse_or_repair(input).unwrap();
        assert!(repaired);
        assert_eq!(value["dates_raw"][0]["label"], "statement_date");
    }

    #[test]
    fn test_truncated_answer() {
        let input = r#"{"domain": "financial", "dates_raw": [{"label": "statement_date", "value": "2025-01"#;
        let (value, repaired) = JsonRepairer::new().parse_or_repair(input).unwrap();
        assert!(repaired);
        assert_eq!(value["domain"], "financial");
        assert_eq!(value["dates_raw"][0]["value"], "2025-01");
    }

    #[test]
    fn test_prose_around_json() {
        let input = "Here is the classification:\n{\"vendor_raw\": \"Chase {Bank}\"}\nLet me know!";
        let (value, repaired) = JsonRepairer::new().parse_or_repair(input).unwrap();
        assert!(repaired);
        assert_eq!(value["vendor_raw"], "Chase {Bank}");
    }

    #[test]
    fn test_string_broken_by_newline() {
        let input = "{\"subject_raw\": \"checking\n, \"vendor_raw\": \"chase\"}";
        assert!(JsonRepairer::new().parse_or_repair(input).is_ok());
    }

    #[test]
    fn test_garbage_is_invalid_response() {
        let err = extract_json_from_response("I cannot classify this document.").unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            FilerError::Llm(ref e) if e.category == ErrorCategory::InvalidResponse
        ));
    }
}
