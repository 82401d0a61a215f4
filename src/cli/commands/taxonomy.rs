//! Taxonomy Command
//!
//! Usage:
//!   docfiler taxonomy list
//!   docfiler taxonomy show [NAME|PATH]

use std::fmt::Write as _;
use std::path::Path;

use crate::cli::select_taxonomy;
use crate::config::ConfigLoader;
use crate::taxonomy::{TaxonomyLoader, TaxonomyVocabulary};
use crate::types::Result;

/// List built-in and project taxonomies
pub fn list() -> Result<()> {
    for name in TaxonomyLoader::available() {
        println!("{}", name);
    }
    Ok(())
}

/// Print a taxonomy as a tree. Without an argument the configured one is shown.
pub fn show(explicit: Option<&Path>, name_or_path: Option<&str>) -> Result<()> {
    let mut config = ConfigLoader::load(explicit)?;
    if let Some(arg) = name_or_path {
        select_taxonomy(&mut config.taxonomy, arg);
    }

    let vocab = TaxonomyLoader::load(&config.taxonomy)?;
    print!("{}", render_tree(&vocab));
    Ok(())
}

pub fn render_tree(vocab: &TaxonomyVocabulary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (version {})", vocab.name(), vocab.version());

    for (domain, entry) in vocab.domains() {
        let _ = writeln!(out, "├── {}", domain);
        for (category, cat) in &entry.categories {
            let year = if cat.year_partitioned { " [by year]" } else { "" };
            let _ = writeln!(out, "│   ├── {}{}", category, year);
            for doctype in &cat.doctypes {
                let _ = writeln!(out, "│   │   └── {}", doctype);
            }
        }
    }

    let doctypes: Vec<&str> = vocab.global_doctypes().map(|(name, _)| name).collect();
    if !doctypes.is_empty() {
        let _ = writeln!(out, "doctypes: {}", doctypes.join(", "));
    }

    let vendors: Vec<&str> = vocab.vendors().collect();
    if !vendors.is_empty() {
        let _ = writeln!(out, "vendors: {}", vendors.join(", "));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tree_lists_household_domains() {
        let vocab = TaxonomyLoader::builtin("household").unwrap();
        let tree = render_tree(&vocab);

        assert!(tree.starts_with("household (version "));
        assert!(tree.contains("├── financial"));
        assert!(tree.contains("│   ├── banking"));
        assert!(tree.contains("vendors: "));
        assert!(tree.contains("chase"));
    }
}
