pub mod cci;
pub mod config;
pub mod extract;
pub mod generate;

use std::path::{Path, PathBuf};

use quotegen_core::models::config::QuoteConfig;
use tracing::debug;

/// `<config dir>/quotegen/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotegen")
        .join("config.json")
}

/// The `--config` path if given, otherwise the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration. An explicit path must exist; the default one may not.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<QuoteConfig> {
    if let Some(path) = explicit {
        return Ok(QuoteConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config from {}", path.display());
        Ok(QuoteConfig::from_file(&path)?)
    } else {
        Ok(QuoteConfig::default())
    }
}
