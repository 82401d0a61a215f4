//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/docfiler/config.toml)
//! 3. Project config (.docfiler/config.toml)
//! 4. Explicit config file (--config)
//! 5. Environment variables (DOCFILER_*)
//! 6. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::{ConfigLoader, ENV_PREFIX};
pub use types::*;
