//! Taxonomy
//!
//! Controlled vocabulary of domains, categories, doctypes and vendors, plus
//! the canonicalization rules that map free-text model output onto it.

mod loader;
mod normalize;
mod vocabulary;

pub use loader::TaxonomyLoader;
pub use normalize::{
    is_valid_slug, normalize_subject, normalize_token, normalize_vendor, singular_forms, slugify,
};
pub use vocabulary::{
    Axis, Canonical, CategoryEntry, DomainEntry, LookupContext, TaxonomyVocabulary,
};

use std::sync::Arc;

pub type SharedTaxonomy = Arc<TaxonomyVocabulary>;
