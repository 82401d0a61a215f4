//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/docfiler/config.toml)
//! 3. Project config (.docfiler/config.toml)
//! 4. Explicit config file (--config)
//! 5. Environment variables (DOCFILER_* prefix, `__` separates sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{FilerError, Result};

/// Environment variable prefix (e.g., DOCFILER_NAMING__STYLE -> naming.style)
pub const ENV_PREFIX: &str = "DOCFILER_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → explicit file → env vars
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit
            && !path.exists()
        {
            return Err(FilerError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let figment = Self::figment(
            Self::global_config_path().as_deref(),
            &Self::project_config_path(),
            explicit,
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        Self::extract(figment)
    }

    /// Load configuration from a specific file only (no env, no global/project files)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path));
        Self::extract(figment)
    }

    fn figment(global: Option<&Path>, project: &Path, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        if let Some(path) = explicit {
            debug!("Loading config from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| FilerError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/docfiler/)
    pub fn global_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("docfiler"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".docfiler")
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());

        let cache = Self::project_dir().join(crate::constants::cache::CACHE_DB_FILE);
        let exists = if cache.exists() { "✓" } else { "✗" };
        println!("  Cache:   {} {}", exists, cache.display());
    }

    /// Render the effective configuration
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| FilerError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            FilerError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::write_default(&global_dir, force)
    }

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        Self::write_default(&Self::project_dir(), force)
    }

    fn write_default(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config_toml())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Default config content (TOML)
    fn default_config_toml() -> &'static str {
        r#"# docfiler configuration
# Project settings in .docfiler/config.toml override the global file.

version = "1.0"

[taxonomy]
name = "household"
# path = "taxonomies/custom.yaml"
mode = "flexible"        # strict | flexible

[naming]
style = "descriptive"    # descriptive | compact
quarterly = false

[extraction]
strategy = "adaptive"    # adaptive | full | first_pages | char_limit
max_chars = 10000

[conflict]
date_tolerance_days = 0

[pipeline]
concurrency = 4
cache = true
standards = "rules"      # rules | ai

[llm]
provider = "openai"      # openai | ollama
timeout_secs = 60
max_retries = 3
# api_key is read from OPENAI_API_KEY or DOCFILER_LLM__API_KEY

[output]
format = "json"          # json | csv | tsv
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NamingStyle, ValidationMode};
    use tempfile::TempDir;

    #[test]
    fn test_default_template_parses() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, ConfigLoader::default_config_toml()).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.taxonomy.name, "household");
        assert_eq!(config.pipeline.concurrency, 4);
    }

    #[test]
    fn test_project_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        let project = temp_dir.path().join("project.toml");
        fs::write(&global, "[naming]\nstyle = \"compact\"\n[taxonomy]\nmode = \"strict\"\n")
            .unwrap();
        fs::write(&project, "[naming]\nstyle = \"descriptive\"\n").unwrap();

        let config: Config = ConfigLoader::figment(Some(&global), &project, None)
            .extract()
            .unwrap();
        assert_eq!(config.naming.style, NamingStyle::Descriptive);
        assert_eq!(config.taxonomy.mode, ValidationMode::Strict);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[pipeline]\nconcurrency = 0\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(matches!(err, FilerError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::load(Some(Path::new("/nonexistent/docfiler.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_env_override() {
        // SAFETY: This test runs in isolation
        unsafe {
            std::env::set_var("DOCFILER_LLM__MODEL", "test-model");
        }
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.llm.model.as_deref(), Some("test-model"));
        unsafe {
            std::env::remove_var("DOCFILER_LLM__MODEL");
        }
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        let toml_out = ConfigLoader::render(&config, false).unwrap();
        assert!(toml_out.contains("[naming]"));
        let json_out = ConfigLoader::render(&config, true).unwrap();
        assert!(json_out.contains("\"naming\""));
    }
}
