//! App configuration, stored as YAML in the user's config directory.
//!
//! Default location: `~/.config/djarch/config.yaml`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use djarch_lib::CollisionScope;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_KEY: &str = "project_state_v1";
pub const DEFAULT_PERSIST_DEBOUNCE_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where project snapshots are kept. `None` means the platform data directory.
    pub storage_dir: Option<PathBuf>,
    /// Name the project snapshot is stored under.
    pub storage_key: String,
    /// Quiet period before a snapshot is written.
    pub persist_debounce_ms: u64,
    pub collision_scope: CollisionScope,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            persist_debounce_ms: DEFAULT_PERSIST_DEBOUNCE_MS,
            collision_scope: CollisionScope::default(),
        }
    }
}

impl AppConfig {
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_storage_dir)
    }
    pub fn persist_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.persist_debounce_ms)
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dj-architect")
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("djarch")
        .join("config.yaml")
}

/// Loads the config at `path`. A missing file gives the defaults, and so does a file that
/// can't be read or parsed (with a warning).
pub fn load_config(path: &Path) -> AppConfig {
    if !path.exists() {
        tracing::info!("no config at {}, using defaults", path.display());
        return AppConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                tracing::info!(
                    "loaded config from {}: key {:?}, debounce {}ms, {:?} collisions",
                    path.display(),
                    config.storage_key,
                    config.persist_debounce_ms,
                    config.collision_scope,
                );
                config
            }
            Err(e) => {
                tracing::warn!("failed to parse config {}: {e}, using defaults", path.display());
                AppConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("failed to read config {}: {e}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let yaml = serde_yaml::to_string(config).context("failed to serialize config")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    Ok(())
}
