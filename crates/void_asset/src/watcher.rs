//! File system watcher that nudges the asset thread
//!
//! Only events for files with a known asset extension are forwarded.
//! Timestamps are still compared by the freshness scan, so the watcher
//! only shortens the delay before a change is noticed.

use crate::error::{AssetError, AssetResult};
use crate::types::AssetType;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// Recursive watch on the asset directory
pub struct AssetDirectoryWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl AssetDirectoryWatcher {
    /// Watch `root`, calling `on_change` for every touched asset file
    pub fn new(root: &Path, on_change: impl Fn(&Path) + Send + 'static) -> AssetResult<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
                    return;
                }
                for path in event.paths.iter().filter(|p| is_asset_file(p)) {
                    on_change(path);
                }
            }
            Err(e) => log::warn!("File watcher error: {}", e),
        })
        .map_err(|e| AssetError::Watcher(e.to_string()))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| AssetError::Watcher(format!("failed to watch {}: {}", root.display(), e)))?;

        log::info!("Watching asset directory: {}", root.display());
        Ok(Self {
            _watcher: watcher,
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_asset_file(path: &Path) -> bool {
    AssetType::from_path(path) != AssetType::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_asset_file() {
        assert!(is_asset_file(Path::new("/a/b/c.png")));
        assert!(!is_asset_file(Path::new("/a/asset_registry.json")));
        assert!(!is_asset_file(Path::new("/a/b/")));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AssetDirectoryWatcher::new(&dir.path().join("absent"), |_| {});
        assert!(matches!(result, Err(AssetError::Watcher(_))));
    }
}
