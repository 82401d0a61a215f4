//! Controlled vocabulary and canonicalization.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use tracing::warn;

use super::normalize::{normalize_token, singular_forms, slugify};
use crate::config::ValidationMode;
use crate::constants::naming::UNKNOWN_VENDOR;
use crate::types::{FilerError, Result};

/// Taxonomy axis being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Domain,
    Category,
    Doctype,
    Vendor,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Domain => "domain",
            Axis::Category => "category",
            Axis::Doctype => "doctype",
            Axis::Vendor => "vendor",
        }
    }

    /// Token used when a flexible lookup has nothing to build a slug from
    fn placeholder(&self) -> &'static str {
        match self {
            Axis::Domain => "",
            Axis::Category => "misc",
            Axis::Doctype => "document",
            Axis::Vendor => UNKNOWN_VENDOR,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup context: the domain scopes categories, domain+category scope doctypes
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupContext<'a> {
    pub domain: Option<&'a str>,
    pub category: Option<&'a str>,
}

impl<'a> LookupContext<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn domain(domain: &'a str) -> Self {
        Self {
            domain: Some(domain),
            category: None,
        }
    }

    pub fn category(domain: &'a str, category: &'a str) -> Self {
        Self {
            domain: Some(domain),
            category: Some(category),
        }
    }
}

/// Outcome of a canonicalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    pub token: String,
    /// False when the token was synthesized in flexible mode
    pub matched: bool,
    pub warning: Option<String>,
}

impl Canonical {
    fn matched(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            matched: true,
            warning: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryEntry {
    pub description: String,
    /// Insert a year directory between category and doctype
    pub year_partitioned: bool,
    /// Doctypes valid only under this category
    pub doctypes: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DomainEntry {
    pub description: String,
    pub categories: BTreeMap<String, CategoryEntry>,
}

/// Read-only vocabulary shared by every stage of a run.
///
/// Built once by the loader, then passed by reference (or `Arc`) everywhere.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyVocabulary {
    pub(super) name: String,
    pub(super) version: String,
    pub(super) domains: BTreeMap<String, DomainEntry>,
    /// Doctypes valid under every category
    pub(super) doctypes: BTreeMap<String, String>,
    pub(super) vendors: BTreeSet<String>,
    pub(super) domain_aliases: HashMap<String, String>,
    /// (domain, alias) -> category
    pub(super) category_aliases: HashMap<(String, String), String>,
    pub(super) doctype_aliases: HashMap<String, String>,
    pub(super) vendor_aliases: HashMap<String, String>,
}

impl TaxonomyVocabulary {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn domains(&self) -> impl Iterator<Item = (&str, &DomainEntry)> {
        self.domains.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn global_doctypes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.doctypes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn vendors(&self) -> impl Iterator<Item = &str> {
        self.vendors.iter().map(String::as_str)
    }

    pub fn category_entry(&self, domain: &str, category: &str) -> Option<&CategoryEntry> {
        self.domains.get(domain)?.categories.get(category)
    }

    /// True when paths under this category are partitioned by year
    pub fn is_year_partitioned(&self, domain: &str, category: &str) -> bool {
        self.category_entry(domain, category)
            .is_some_and(|entry| entry.year_partitioned)
    }

    /// Every canonical token on an axis under a context
    pub fn tokens(&self, axis: Axis, ctx: &LookupContext<'_>) -> Vec<String> {
        match axis {
            Axis::Domain => self.domains.keys().cloned().collect(),
            Axis::Category => match ctx.domain.and_then(|d| self.domains.get(d)) {
                Some(entry) => entry.categories.keys().cloned().collect(),
                None => self
                    .domains
                    .values()
                    .flat_map(|d| d.categories.keys().cloned())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect(),
            },
            Axis::Doctype => {
                let mut all: BTreeSet<String> = self.doctypes.keys().cloned().collect();
                if let (Some(domain), Some(category)) = (ctx.domain, ctx.category)
                    && let Some(entry) = self.category_entry(domain, category)
                {
                    all.extend(entry.doctypes.iter().cloned());
                }
                all.into_iter().collect()
            }
            Axis::Vendor => self.vendors.iter().cloned().collect(),
        }
    }

    fn contains(&self, axis: Axis, ctx: &LookupContext<'_>, token: &str) -> bool {
        match axis {
            Axis::Domain => self.domains.contains_key(token),
            Axis::Category => match ctx.domain.and_then(|d| self.domains.get(d)) {
                Some(entry) => entry.categories.contains_key(token),
                None => self
                    .domains
                    .values()
                    .any(|d| d.categories.contains_key(token)),
            },
            Axis::Doctype => {
                self.doctypes.contains_key(token)
                    || match (ctx.domain, ctx.category) {
                        (Some(domain), Some(category)) => self
                            .category_entry(domain, category)
                            .is_some_and(|entry| entry.doctypes.contains(token)),
                        _ => self
                            .domains
                            .values()
                            .flat_map(|d| d.categories.values())
                            .any(|entry| entry.doctypes.contains(token)),
                    }
            }
            Axis::Vendor => self.vendors.contains(token),
        }
    }

    fn alias(&self, axis: Axis, ctx: &LookupContext<'_>, key: &str) -> Option<&str> {
        match axis {
            Axis::Domain => self.domain_aliases.get(key),
            Axis::Category => {
                let domain = ctx.domain?;
                self.category_aliases
                    .get(&(domain.to_string(), key.to_string()))
            }
            Axis::Doctype => self.doctype_aliases.get(key),
            Axis::Vendor => self.vendor_aliases.get(key),
        }
        .map(String::as_str)
    }

    /// Map a free-text value onto the vocabulary.
    ///
    /// Lookup order: exact (case-insensitive) → alias table → fuzzy slug
    /// (including plural-stripped forms) → flexible synthesis or error.
    /// The domain axis never synthesizes.
    pub fn canonicalize(
        &self,
        raw: &str,
        axis: Axis,
        ctx: &LookupContext<'_>,
        mode: ValidationMode,
    ) -> Result<Canonical> {
        let exact = raw.trim().to_lowercase();
        if self.contains(axis, ctx, &exact) {
            return Ok(Canonical::matched(exact));
        }

        if let Some(target) = self.alias(axis, ctx, &normalize_token(raw)) {
            return Ok(Canonical::matched(target));
        }

        let slug = slugify(raw);
        if !slug.is_empty() {
            if self.contains(axis, ctx, &slug) {
                return Ok(Canonical::matched(slug));
            }
            if let Some(target) = self.alias(axis, ctx, &slug) {
                return Ok(Canonical::matched(target));
            }
            for form in singular_forms(&slug) {
                if self.contains(axis, ctx, &form) {
                    return Ok(Canonical::matched(form));
                }
            }
        }

        if axis == Axis::Domain || mode == ValidationMode::Strict {
            return Err(FilerError::UnknownTaxonomyValue {
                axis: axis.to_string(),
                value: raw.to_string(),
            });
        }

        let token = if slug.is_empty() {
            axis.placeholder().to_string()
        } else {
            slug
        };
        let warning = format!(
            "{} '{}' is not in taxonomy '{}', using '{}'",
            axis, raw, self.name, token
        );
        warn!("{}", warning);

        Ok(Canonical {
            token,
            matched: false,
            warning: Some(warning),
        })
    }

    // =========================================================================
    // Prompt Rendering
    // =========================================================================

    /// Render the vocabulary as an XML block for classification prompts
    pub fn to_prompt_xml(&self) -> String {
        let mut xml = format!(
            "<taxonomy name=\"{}\" version=\"{}\">\n",
            xml_escape(&self.name),
            xml_escape(&self.version)
        );

        for (name, domain) in &self.domains {
            xml.push_str(&format!(
                "  <domain name=\"{}\" description=\"{}\">\n",
                name,
                xml_escape(&domain.description)
            ));
            for (cat_name, category) in &domain.categories {
                if category.doctypes.is_empty() {
                    xml.push_str(&format!(
                        "    <category name=\"{}\" description=\"{}\"/>\n",
                        cat_name,
                        xml_escape(&category.description)
                    ));
                } else {
                    let doctypes: Vec<&str> =
                        category.doctypes.iter().map(String::as_str).collect();
                    xml.push_str(&format!(
                        "    <category name=\"{}\" description=\"{}\" doctypes=\"{}\"/>\n",
                        cat_name,
                        xml_escape(&category.description),
                        doctypes.join(",")
                    ));
                }
            }
            xml.push_str("  </domain>\n");
        }

        xml.push_str("  <doctypes>\n");
        for (name, description) in &self.doctypes {
            xml.push_str(&format!(
                "    <doctype name=\"{}\" description=\"{}\"/>\n",
                name,
                xml_escape(description)
            ));
        }
        xml.push_str("  </doctypes>\n</taxonomy>");
        xml
    }
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
