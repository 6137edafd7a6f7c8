//! Centralized directory structure and persisted settings for HomeHero
//!
//! Directory layout:
//! ```text
//! homehero_data/
//! ├── session.json     # access token and signed-in identity
//! └── logs/            # rolling client logs
//! ```

pub mod catalog;
pub mod format;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings persisted in the platform config directory.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub data_root: Option<PathBuf>,
    pub api_url: Option<String>,
    pub login_route: Option<String>,
}

/// Get the global configuration path
fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("homehero").join("config.json"))
}

/// Load settings from `path`; a missing or unreadable file yields defaults.
pub fn load_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to parse config file at {:?}: {}", path, e);
                AppConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read config file at {:?}: {}", path, e);
            AppConfig::default()
        }
    }
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load the persisted settings from the platform config directory.
pub fn load_config() -> AppConfig {
    get_config_path()
        .map(|p| load_config_from(&p))
        .unwrap_or_default()
}

/// Get the data root from environment, persistent config, or default
pub fn data_root() -> PathBuf {
    if let Ok(val) = std::env::var("HOMEHERO_ROOT") {
        if !val.trim().is_empty() {
            return PathBuf::from(val);
        }
    }

    if let Some(root) = load_config().data_root {
        return root;
    }

    PathBuf::from("homehero_data")
}

/// API URL from environment, then persisted config.
pub fn configured_api_url() -> Option<String> {
    std::env::var("HOMEHERO_API_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| load_config().api_url)
}

/// Session file (token + identity) under `root`.
pub fn session_path(root: &Path) -> PathBuf {
    root.join("session.json")
}

/// Log directory under `root`.
pub fn logs_dir(root: &Path) -> PathBuf {
    root.join("logs")
}

/// Ensure a single directory exists
pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        info!("Created directory: {:?}", path);
    }
    Ok(())
}

/// Create the data root and its subdirectories; returns the canonical root.
pub fn init_structure(root: &Path) -> anyhow::Result<PathBuf> {
    ensure_dir(root)?;
    ensure_dir(&logs_dir(root))?;

    let canonical = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    info!("HomeHero data directory initialized at: {:?}", canonical);
    Ok(canonical)
}
