//! Taxonomy Loader
//!
//! Reads vocabulary definitions from YAML. Built-in taxonomies are embedded
//! in the binary; custom ones are loaded from `taxonomy.path` or from
//! `.docfiler/taxonomies/<name>.yaml`.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::normalize::{is_valid_slug, normalize_token};
use super::vocabulary::{CategoryEntry, DomainEntry, TaxonomyVocabulary};
use crate::config::{ConfigLoader, TaxonomyConfig};
use crate::types::{FilerError, Result};

const BUILTIN: &[(&str, &str)] = &[(
    "household",
    include_str!("../../taxonomies/household.yaml"),
)];

// =============================================================================
// YAML Schema
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaxonomyFile {
    name: String,
    #[serde(default = "default_version")]
    version: String,
    domains: BTreeMap<String, DomainDef>,
    #[serde(default)]
    doctypes: BTreeMap<String, String>,
    #[serde(default)]
    doctype_aliases: BTreeMap<String, String>,
    #[serde(default)]
    vendors: Vec<String>,
    #[serde(default)]
    vendor_aliases: BTreeMap<String, String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DomainDef {
    #[serde(default)]
    description: String,
    #[serde(default)]
    aliases: Vec<String>,
    categories: BTreeMap<String, CategoryDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CategoryDef {
    description: String,
    aliases: Vec<String>,
    year_partitioned: bool,
    doctypes: Vec<String>,
}

// =============================================================================
// Loader
// =============================================================================

pub struct TaxonomyLoader;

impl TaxonomyLoader {
    /// Resolve the taxonomy named by the configuration
    pub fn load(config: &TaxonomyConfig) -> Result<TaxonomyVocabulary> {
        if let Some(path) = &config.path {
            return Self::from_file(path);
        }

        let custom = Self::custom_path(&config.name);
        if custom.exists() {
            return Self::from_file(&custom);
        }

        Self::builtin(&config.name)
    }

    /// Load an embedded taxonomy by name
    pub fn builtin(name: &str) -> Result<TaxonomyVocabulary> {
        let (_, source) = BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .ok_or_else(|| {
                FilerError::Config(format!(
                    "Unknown taxonomy '{}'. Available: {}",
                    name,
                    Self::builtin_names().join(", ")
                ))
            })?;
        debug!("Loading built-in taxonomy: {}", name);
        Self::from_yaml_str(source)
    }

    pub fn builtin_names() -> Vec<&'static str> {
        BUILTIN.iter().map(|(name, _)| *name).collect()
    }

    /// Taxonomies available to the current project: built-ins plus any
    /// YAML files under `.docfiler/taxonomies/`
    pub fn available() -> Vec<String> {
        let mut names: BTreeSet<String> =
            Self::builtin_names().into_iter().map(String::from).collect();

        if let Ok(entries) = fs::read_dir(Self::custom_dir()) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml")
                    && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                {
                    names.insert(stem.to_string());
                }
            }
        }

        names.into_iter().collect()
    }

    pub fn from_file(path: &Path) -> Result<TaxonomyVocabulary> {
        if !path.exists() {
            return Err(FilerError::Config(format!(
                "Taxonomy file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        let vocab = Self::from_yaml_str(&content)?;
        info!("Loaded taxonomy '{}' from {}", vocab.name(), path.display());
        Ok(vocab)
    }

    pub fn from_yaml_str(content: &str) -> Result<TaxonomyVocabulary> {
        let file: TaxonomyFile = serde_yaml::from_str(content)?;
        Self::build(file)
    }

    fn custom_dir() -> PathBuf {
        ConfigLoader::project_dir().join("taxonomies")
    }

    fn custom_path(name: &str) -> PathBuf {
        Self::custom_dir().join(format!("{}.yaml", name))
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn build(file: TaxonomyFile) -> Result<TaxonomyVocabulary> {
        let mut vocab = TaxonomyVocabulary {
            name: file.name,
            version: file.version,
            ..Default::default()
        };

        if vocab.name.trim().is_empty() {
            return Err(invalid("taxonomy name is empty"));
        }
        if file.domains.is_empty() {
            return Err(invalid("taxonomy defines no domains"));
        }

        for (name, description) in file.doctypes {
            require_slug("doctype", &name)?;
            vocab.doctypes.insert(name, description);
        }

        for vendor in file.vendors {
            require_slug("vendor", &vendor)?;
            vocab.vendors.insert(vendor);
        }

        for (domain_name, domain) in file.domains {
            require_slug("domain", &domain_name)?;
            if domain.categories.is_empty() {
                return Err(invalid(&format!("domain '{}' has no categories", domain_name)));
            }

            for alias in domain.aliases {
                vocab
                    .domain_aliases
                    .insert(normalize_token(&alias), domain_name.clone());
            }

            let mut entry = DomainEntry {
                description: domain.description,
                categories: BTreeMap::new(),
            };

            for (cat_name, category) in domain.categories {
                require_slug("category", &cat_name)?;
                for doctype in &category.doctypes {
                    require_slug("doctype", doctype)?;
                }
                for alias in category.aliases {
                    vocab
                        .category_aliases
                        .insert((domain_name.clone(), normalize_token(&alias)), cat_name.clone());
                }
                entry.categories.insert(
                    cat_name,
                    CategoryEntry {
                        description: category.description,
                        year_partitioned: category.year_partitioned,
                        doctypes: category.doctypes.into_iter().collect(),
                    },
                );
            }

            vocab.domains.insert(domain_name, entry);
        }

        let scoped_doctypes: BTreeSet<&String> = vocab
            .domains
            .values()
            .flat_map(|d| d.categories.values())
            .flat_map(|c| c.doctypes.iter())
            .collect();

        let mut doctype_aliases = Vec::new();
        for (alias, target) in file.doctype_aliases {
            if !vocab.doctypes.contains_key(&target) && !scoped_doctypes.contains(&target) {
                return Err(invalid(&format!(
                    "doctype alias '{}' points to unknown doctype '{}'",
                    alias, target
                )));
            }
            doctype_aliases.push((normalize_token(&alias), target));
        }
        vocab.doctype_aliases.extend(doctype_aliases);

        for (alias, target) in file.vendor_aliases {
            if !vocab.vendors.contains(&target) {
                return Err(invalid(&format!(
                    "vendor alias '{}' points to unknown vendor '{}'",
                    alias, target
                )));
            }
            vocab.vendor_aliases.insert(normalize_token(&alias), target);
        }

        for target in vocab.domain_aliases.values() {
            if !vocab.domains.contains_key(target) {
                return Err(invalid(&format!("domain alias points to unknown domain '{}'", target)));
            }
        }

        Ok(vocab)
    }
}

fn require_slug(axis: &str, value: &str) -> Result<()> {
    if is_valid_slug(value) {
        Ok(())
    } else {
        Err(invalid(&format!("{} '{}' is not a lowercase slug", axis, value)))
    }
}

fn invalid(message: &str) -> FilerError {
    FilerError::Config(format!("Invalid taxonomy: {}", message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationMode;
    use crate::taxonomy::{Axis, LookupContext};
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
name: mini
version: "2.1"
domains:
  financial:
    description: Money matters
    aliases: [finance]
    categories:
      banking:
        aliases: [bank]
doctypes:
  statement: Periodic account statement
doctype_aliases:
  bank statement: statement
vendors: [chase]
vendor_aliases:
  Chase Bank: chase
"#;

    #[test]
    fn test_builtin_household_loads() {
        let vocab = TaxonomyLoader::builtin("household").unwrap();
        assert_eq!(vocab.name(), "household");
        assert!(vocab.domains().count() >= 5);
        assert!(vocab.vendors().any(|v| v == "chase"));
    }

    #[test]
    fn test_unknown_builtin() {
        let err = TaxonomyLoader::builtin("corporate").unwrap_err();
        assert!(err.to_string().contains("household"));
    }

    #[test]
    fn test_minimal_yaml() {
        let vocab = TaxonomyLoader::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(vocab.version(), "2.1");

        let ctx = LookupContext::none();
        let domain = vocab
            .canonicalize("Finance", Axis::Domain, &ctx, ValidationMode::Strict)
            .unwrap();
        assert_eq!(domain.token, "financial");

        let vendor = vocab
            .canonicalize("chase bank", Axis::Vendor, &ctx, ValidationMode::Strict)
            .unwrap();
        assert_eq!(vendor.token, "chase");

        let doctype = vocab
            .canonicalize("Bank Statement", Axis::Doctype, &ctx, ValidationMode::Strict)
            .unwrap();
        assert_eq!(doctype.token, "statement");
    }

    #[test]
    fn test_rejects_non_slug_tokens() {
        let yaml = MINIMAL.replace("banking:", "Banking:");
        let err = TaxonomyLoader::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("slug"));
    }

    #[test]
    fn test_rejects_dangling_alias() {
        let yaml = MINIMAL.replace("Chase Bank: chase", "Chase Bank: jpmorgan");
        let err = TaxonomyLoader::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("unknown vendor"));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let yaml = format!("{}\nextra: true\n", MINIMAL);
        assert!(TaxonomyLoader::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mini.yaml");
        fs::write(&path, MINIMAL).unwrap();

        let config = TaxonomyConfig {
            path: Some(path),
            ..Default::default()
        };
        let vocab = TaxonomyLoader::load(&config).unwrap();
        assert_eq!(vocab.name(), "mini");
    }

    #[test]
    fn test_missing_file() {
        let err = TaxonomyLoader::from_file(Path::new("/nonexistent/tax.yaml")).unwrap_err();
        assert!(matches!(err, FilerError::Config(_)));
    }
}
