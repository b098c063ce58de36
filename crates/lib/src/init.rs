//! Initialize the configuration directory: create ~/.banter, a default
//! config, and the data directory with empty content files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config;
use crate::content::ContentCategory;

const CONTENT_FILES: [ContentCategory; 4] = [
    ContentCategory::Quotes,
    ContentCategory::Images,
    ContentCategory::Gifs,
    ContentCategory::Videos,
];

/// Ensure the configuration directory has been initialized (config file and
/// data directory exist).
pub fn require_initialized(config_path: &Path, config: &config::Config) -> Result<()> {
    if !config_path.exists() {
        anyhow::bail!(
            "configuration not initialized; run `banter init` first (config file not found: {})",
            config_path.display()
        );
    }
    let data_dir = config::resolve_data_dir(config, config_path);
    if !data_dir.exists() {
        anyhow::bail!(
            "configuration not initialized; run `banter init` first (data directory not found: {})",
            data_dir.display()
        );
    }
    Ok(())
}

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` with `{}` if missing.
/// - Creates the data directory and seeds empty content files if missing.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, b"{}")
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let data_dir = config_dir.join("Data");
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;
        log::info!("created data directory at {}", data_dir.display());
    }
    for category in CONTENT_FILES {
        let path = data_dir.join(category.file_name());
        if !path.exists() {
            std::fs::write(&path, b"")
                .with_context(|| format!("creating content file {}", path.display()))?;
        }
    }

    Ok(config_dir.to_path_buf())
}
