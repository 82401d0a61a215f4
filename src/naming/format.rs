//! Case conversion and pluralization for directory segments.

/// `home_improvement` → `Home_Improvement`
pub fn title_case(slug: &str) -> String {
    slug.split('_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("_")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Plural, title-cased folder name for a doctype.
pub fn pluralize_doctype(doctype: &str) -> String {
    match doctype {
        "policy" => return "Policies".to_string(),
        "1099" => return "1099s".to_string(),
        "1040" => return "1040s".to_string(),
        "w2" => return "W2s".to_string(),
        _ => {}
    }

    let formatted = title_case(doctype);

    // Already plural ("lab_results")
    if formatted.ends_with('s') && !["ss", "es", "xs", "zs"].iter().any(|s| formatted.ends_with(s)) {
        return formatted;
    }

    let mut chars = formatted.chars().rev();
    if let (Some('y'), Some(prev)) = (chars.next(), chars.next())
        && !"aeiou".contains(prev)
    {
        return format!("{}ies", &formatted[..formatted.len() - 1]);
    }

    if ["s", "x", "z", "ch", "sh"].iter().any(|s| formatted.ends_with(s)) {
        format!("{}es", formatted)
    } else {
        format!("{}s", formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("financial"), "Financial");
        assert_eq!(title_case("home_improvement"), "Home_Improvement");
        assert_eq!(title_case("bank_of_america"), "Bank_Of_America");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_pluralize_regular() {
        assert_eq!(pluralize_doctype("statement"), "Statements");
        assert_eq!(pluralize_doctype("invoice"), "Invoices");
        assert_eq!(pluralize_doctype("receipt"), "Receipts");
        assert_eq!(pluralize_doctype("tax_return"), "Tax_Returns");
    }

    #[test]
    fn test_pluralize_irregular() {
        assert_eq!(pluralize_doctype("policy"), "Policies");
        assert_eq!(pluralize_doctype("warranty"), "Warranties");
        assert_eq!(pluralize_doctype("survey"), "Surveys");
        assert_eq!(pluralize_doctype("w2"), "W2s");
        assert_eq!(pluralize_doctype("1099"), "1099s");
        assert_eq!(pluralize_doctype("box"), "Boxes");
        assert_eq!(pluralize_doctype("business"), "Businesses");
        assert_eq!(pluralize_doctype("match"), "Matches");
    }

    #[test]
    fn test_pluralize_keeps_plural() {
        assert_eq!(pluralize_doctype("lab_results"), "Lab_Results");
        assert_eq!(pluralize_doctype("eob"), "Eobs");
    }
}
