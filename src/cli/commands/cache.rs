//! Cache Command
//!
//! Inspect or empty the result cache at .docfiler/cache.db.

use crate::cli::{Output, cache_path};
use crate::storage::ResultCache;
use crate::types::Result;

/// Show how many results are cached
pub fn stats() -> Result<()> {
    let path = cache_path();
    if !path.exists() {
        Output::new().info("No result cache yet");
        return Ok(());
    }

    let cache = ResultCache::open(&path)?;
    println!("{}: {} cached results", path.display(), cache.len()?);
    Ok(())
}

/// Remove every cached result
pub fn clear() -> Result<()> {
    let path = cache_path();
    let output = Output::new();
    if !path.exists() {
        output.info("No result cache to clear");
        return Ok(());
    }

    let removed = ResultCache::open(&path)?.clear()?;
    output.success(&format!("Cleared {} cached results", removed));
    Ok(())
}
