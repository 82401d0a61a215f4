//! Archival Naming
//!
//! Directory layout and filename conventions for classified documents.
//!
//! - **descriptive**: `Domain/Category/Doctypes/doctype_vendor[_subject][_date][_qN].ext`
//! - **compact**: `Domain/Category/Doctypes/vendor[_date].ext`
//!
//! Year-partitioned categories (e.g. `Tax/Federal`) get an extra
//! `YYYY` directory before the doctype folder.

mod builder;
mod format;

pub use builder::{BuiltPath, PathOptions, build_path};
pub use format::{pluralize_doctype, title_case};

use crate::config::NamingConfig;
use crate::taxonomy::TaxonomyVocabulary;
use crate::types::{NormalizedMetadata, Result};

/// Build a path with layout options taken from the taxonomy and naming config
pub fn build_document_path(
    metadata: &NormalizedMetadata,
    taxonomy: &TaxonomyVocabulary,
    naming: &NamingConfig,
    extension: &str,
) -> Result<BuiltPath> {
    let options = PathOptions {
        year_partitioned: taxonomy.is_year_partitioned(&metadata.domain, &metadata.category),
        quarterly: naming.quarterly,
    };
    build_path(metadata, naming.style, extension, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingStyle;
    use crate::taxonomy::TaxonomyLoader;

    #[test]
    fn test_year_partition_comes_from_taxonomy() {
        let taxonomy = TaxonomyLoader::builtin("household").unwrap();
        let metadata = NormalizedMetadata {
            domain: "tax".to_string(),
            category: "federal".to_string(),
            doctype: "1099".to_string(),
            vendor_name: "fidelity".to_string(),
            date: "2024".to_string(),
            subject: String::new(),
        };

        let built = build_document_path(&metadata, &taxonomy, &NamingConfig::default(), "pdf")
            .unwrap();
        assert_eq!(built.full_path(), "Tax/Federal/2024/1099s/1099_fidelity_2024.pdf");

        let compact = NamingConfig {
            style: NamingStyle::Compact,
            quarterly: false,
        };
        let built = build_document_path(&metadata, &taxonomy, &compact, "pdf").unwrap();
        assert_eq!(built.filename, "fidelity_2024.pdf");
    }
}
