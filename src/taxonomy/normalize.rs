//! Token normalization shared by the resolver, the standards rules and the
//! path builder.

use regex::Regex;
use std::sync::LazyLock;

use crate::constants::naming::{INVALID_VENDORS, SUBJECT_STOP_WORDS, VENDOR_WEB_SUFFIXES};

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:_[a-z0-9]+)*$").expect("static regex"));

/// Light normalization used for alias keys: trim, lowercase, spaces and
/// hyphens become underscores.
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Fuzzy normalization: lowercase, every run of non-alphanumeric characters
/// becomes one underscore, no leading or trailing underscores.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for c in raw.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            // Apostrophes join words ("lowe's" -> "lowes")
            if c != '\'' && c != '\u{2019}' {
                pending_sep = true;
            }
        }
    }

    slug
}

/// True when `value` is a canonical slug (`[a-z0-9]` words joined by `_`).
pub fn is_valid_slug(value: &str) -> bool {
    SLUG_RE.is_match(value)
}

/// Plural-stripped variants tried during fuzzy matching.
pub fn singular_forms(slug: &str) -> Vec<String> {
    let mut forms = Vec::new();
    if let Some(stem) = slug.strip_suffix("ies") {
        forms.push(format!("{}y", stem));
    }
    if let Some(stem) = slug.strip_suffix("es") {
        forms.push(stem.to_string());
    }
    if let Some(stem) = slug.strip_suffix('s')
        && !stem.ends_with('s')
    {
        forms.push(stem.to_string());
    }
    forms.retain(|f| !f.is_empty());
    forms
}

/// Vendor pre-normalization: drop `www.` and web suffixes, then slugify.
/// Placeholder values ("n/a", "unknown", ...) normalize to an empty string.
pub fn normalize_vendor(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if INVALID_VENDORS.contains(&lower.as_str()) {
        return String::new();
    }

    let mut name = lower.strip_prefix("www.").unwrap_or(&lower).to_string();
    for suffix in VENDOR_WEB_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix)
            && !stripped.is_empty()
        {
            name = stripped.to_string();
            break;
        }
    }

    let slug = slugify(&name);
    if INVALID_VENDORS.contains(&slug.as_str()) {
        String::new()
    } else {
        slug
    }
}

/// Subject slug: stop words removed, at most `max_words` words.
pub fn normalize_subject(raw: &str, max_words: usize) -> String {
    slugify(raw)
        .split('_')
        .filter(|word| !word.is_empty() && !SUBJECT_STOP_WORDS.contains(word))
        .take(max_words)
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("  Real Estate "), "real_estate");
        assert_eq!(normalize_token("Home-Repairs"), "home_repairs");
        assert_eq!(normalize_token("W-2"), "w_2");
    }

    #[test]
    fn test_slugify_strips_punctuation() {
        assert_eq!(slugify("Chase Bank, N.A."), "chase_bank_n_a");
        assert_eq!(slugify("__Statement__"), "statement");
        assert_eq!(slugify("Lowe's"), "lowes");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("Café Olé"), "caf_ol");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("home_improvement"));
        assert!(is_valid_slug("1099"));
        assert!(!is_valid_slug("Home"));
        assert!(!is_valid_slug("a__b"));
        assert!(!is_valid_slug("_a"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_singular_forms() {
        assert!(singular_forms("policies").contains(&"policy".to_string()));
        assert!(singular_forms("statements").contains(&"statement".to_string()));
        assert!(singular_forms("taxes").contains(&"tax".to_string()));
        assert!(singular_forms("glass").is_empty());
    }

    #[test]
    fn test_normalize_vendor() {
        assert_eq!(normalize_vendor("www.Amazon.com"), "amazon");
        assert_eq!(normalize_vendor("bbc.co.uk"), "bbc");
        assert_eq!(normalize_vendor("Home Depot"), "home_depot");
        assert_eq!(normalize_vendor("N/A"), "");
        assert_eq!(normalize_vendor("  unknown "), "");
        assert_eq!(normalize_vendor(""), "");
    }

    #[test]
    fn test_normalize_subject() {
        assert_eq!(normalize_subject("checking account", 3), "checking");
        assert_eq!(normalize_subject("The Cost of the Roof Repair Estimate", 3), "cost_roof_repair");
        assert_eq!(normalize_subject("", 3), "");
    }
}
