//! Asset manager configuration

use crate::error::{AssetError, AssetResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for [`EditorAssetManager`](crate::EditorAssetManager)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManagerConfig {
    /// Root that registry paths are relative to
    pub asset_directory: PathBuf,
    /// Registry JSON file
    pub registry_path: PathBuf,
    /// Run the background asset thread
    pub async_assets: bool,
    /// Freshness scan interval of the asset thread
    pub monitor_interval_ms: u64,
    /// How long a load waits for a locked file
    pub file_wait_timeout_ms: u64,
    /// Import everything under the asset directory at startup
    pub scan_on_startup: bool,
    /// Wake the asset thread on file-system events
    pub hot_reload: bool,
}

impl Default for AssetManagerConfig {
    fn default() -> Self {
        Self {
            asset_directory: PathBuf::from("assets"),
            registry_path: PathBuf::from("asset_registry.json"),
            async_assets: true,
            monitor_interval_ms: 100,
            file_wait_timeout_ms: 100,
            scan_on_startup: true,
            hot_reload: true,
        }
    }
}

impl AssetManagerConfig {
    /// Standard layout for a project directory
    pub fn for_project(project_dir: impl AsRef<Path>) -> Self {
        let project_dir = project_dir.as_ref();
        Self {
            asset_directory: project_dir.join("assets"),
            registry_path: project_dir.join("asset_registry.json"),
            ..Default::default()
        }
    }

    /// Parse from TOML; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> AssetResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file
    pub fn load(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms.max(1))
    }

    pub fn file_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.file_wait_timeout_ms)
    }
}
