//! CLI Common Utilities
//!
//! Shared configuration, taxonomy and cache setup for command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{Config, ConfigLoader, TaxonomyConfig};
use crate::constants::cache::CACHE_DB_FILE;
use crate::storage::{ResultCache, SharedCache};
use crate::taxonomy::{SharedTaxonomy, TaxonomyLoader};
use crate::types::Result;

/// Resources every classification run needs, resolved before any document
/// is touched so configuration problems abort the run up front.
pub struct CommandContext {
    pub config: Config,
    pub taxonomy: SharedTaxonomy,
}

impl CommandContext {
    /// Load config, let `adjust` apply flag overrides, validate, then load
    /// the taxonomy the final config names.
    pub fn load<F>(explicit: Option<&Path>, adjust: F) -> Result<Self>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = ConfigLoader::load(explicit)?;
        adjust(&mut config);
        config.validate()?;

        let taxonomy = Arc::new(TaxonomyLoader::load(&config.taxonomy)?);
        debug!(
            "Taxonomy {}@{}, mode {}",
            taxonomy.name(),
            taxonomy.version(),
            config.taxonomy.mode
        );

        Ok(Self { config, taxonomy })
    }
}

/// Point the taxonomy config at `arg`: a YAML path when it looks like one,
/// otherwise a taxonomy name.
pub fn select_taxonomy(taxonomy: &mut TaxonomyConfig, arg: &str) {
    let path = Path::new(arg);
    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml");

    if is_yaml || path.is_file() {
        taxonomy.path = Some(path.to_path_buf());
    } else {
        taxonomy.name = arg.to_string();
        taxonomy.path = None;
    }
}

/// Result cache database path (.docfiler/cache.db)
pub fn cache_path() -> PathBuf {
    ConfigLoader::project_dir().join(CACHE_DB_FILE)
}

/// Open the result cache when enabled. A cache that cannot be opened only
/// disables caching for this run.
pub fn open_cache(enabled: bool) -> Option<SharedCache> {
    if !enabled {
        return None;
    }

    let path = cache_path();
    match ResultCache::open(&path) {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            warn!("Result cache unavailable ({}): {}", path.display(), e);
            None
        }
    }
}
