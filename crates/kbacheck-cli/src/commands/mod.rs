//! Subcommand implementations.

pub mod analyze;
pub mod batch;
pub mod config;
pub mod glossary;
pub mod templates;

use std::path::{Path, PathBuf};

use kbacheck_core::{CodeGlossary, KbaConfig};
use tracing::debug;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kbacheck")
        .join("config.json")
}

/// Load the configuration named by `-c`, else the default file if present,
/// else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<KbaConfig> {
    if let Some(path) = config_path {
        return Ok(KbaConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        Ok(KbaConfig::from_file(&default_path)?)
    } else {
        Ok(KbaConfig::default())
    }
}

/// Open the code glossary configured in `config`.
pub fn open_glossary(config: &KbaConfig) -> CodeGlossary {
    let path = config.glossary.database_path();
    debug!("Opening code glossary at {}", path.display());
    CodeGlossary::open_file(path)
}
