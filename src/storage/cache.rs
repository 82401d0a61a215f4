//! Result cache keyed by document content.
//!
//! A hit means the same bytes were already classified under the same
//! taxonomy and the same result-shaping settings, so every AI call can be
//! skipped.

use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::database::Database;
use crate::config::{
    Config, ConflictConfig, ExtractionConfig, NamingConfig, StandardsMode, TaxonomyConfig,
};
use crate::taxonomy::TaxonomyVocabulary;
use crate::types::{ClassificationResult, Result, ResultExt};

pub type SharedCache = Arc<ResultCache>;

/// Content hash plus the settings that shape a result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub content_hash: String,
    pub profile: String,
}

impl CacheKey {
    pub fn new(bytes: &[u8], taxonomy: &TaxonomyVocabulary, config: &Config) -> Result<Self> {
        Ok(Self {
            content_hash: content_hash(bytes),
            profile: profile(taxonomy, config)?,
        })
    }
}

/// Settings that can change a result. Retry, timeout, concurrency and output
/// settings are left out.
#[derive(Serialize)]
struct ProfileSettings<'a> {
    taxonomy: &'a TaxonomyConfig,
    naming: &'a NamingConfig,
    extraction: &'a ExtractionConfig,
    conflict: &'a ConflictConfig,
    standards: StandardsMode,
    provider: &'a str,
    model: Option<&'a str>,
    temperature: f32,
}

/// `name@version:` followed by a SHA-256 over [`ProfileSettings`]
fn profile(taxonomy: &TaxonomyVocabulary, config: &Config) -> Result<String> {
    let settings = ProfileSettings {
        taxonomy: &config.taxonomy,
        naming: &config.naming,
        extraction: &config.extraction,
        conflict: &config.conflict,
        standards: config.pipeline.standards,
        provider: &config.llm.provider,
        model: config.llm.model.as_deref(),
        temperature: config.llm.temperature,
    };
    let json = serde_json::to_vec(&settings)?;
    Ok(format!(
        "{}@{}:{}",
        taxonomy.name(),
        taxonomy.version(),
        content_hash(&json)
    ))
}

/// Lowercase hex SHA-256 of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub struct ResultCache {
    db: Database,
}

impl ResultCache {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            db: Database::open(path)?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
        })
    }

    /// Cached result for `key`, if any. A row that no longer deserializes is
    /// treated as a miss.
    pub fn get(&self, key: &CacheKey) -> Result<Option<ClassificationResult>> {
        let conn = self.db.connection()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT result_json FROM result_cache WHERE content_hash = ?1 AND profile = ?2",
                params![key.content_hash, key.profile],
                |row| row.get(0),
            )
            .optional()
            .with_context("Failed to read result cache")?;

        Ok(json.and_then(|json| match serde_json::from_str(&json) {
            Ok(result) => Some(result),
            Err(e) => {
                debug!("ignoring stale cache row {}: {}", key.content_hash, e);
                None
            }
        }))
    }

    /// Store a successful result. Failed results are never cached.
    pub fn put(&self, key: &CacheKey, result: &ClassificationResult) -> Result<bool> {
        if result.is_failed() {
            return Ok(false);
        }

        let json = serde_json::to_string(result)?;
        let conn = self.db.connection()?;
        conn.execute(
            "INSERT OR REPLACE INTO result_cache (content_hash, profile, result_json, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                key.content_hash,
                key.profile,
                json,
                chrono::Utc::now().to_rfc3339()
            ],
        )
        .with_context("Failed to write result cache")?;
        Ok(true)
    }

    /// Remove every entry, returning how many were removed
    pub fn clear(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        conn.execute("DELETE FROM result_cache", [])
            .with_context("Failed to clear result cache")
    }

    pub fn len(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM result_cache", [], |row| row.get(0))
            .with_context("Failed to count result cache")?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
