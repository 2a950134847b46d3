//! Asset metadata - the registry's record of a disk-backed asset

use crate::asset::AssetRef;
use crate::handle::AssetHandle;
use crate::types::AssetType;
use std::path::PathBuf;

/// Load status recorded in metadata
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AssetStatus {
    #[default]
    None,
    Ready,
    Invalid,
    Loading,
}

/// Where an asset is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetLifecycle {
    /// No metadata and not memory-only
    Unregistered,
    /// Metadata exists, data not loaded
    Registered,
    /// Queued or running on the asset thread
    Loading,
    /// Data cached and usable
    Loaded,
}

/// Description of a disk-backed asset
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    pub handle: AssetHandle,
    pub asset_type: AssetType,
    /// Relative to the asset directory
    pub file_path: PathBuf,
    pub status: AssetStatus,
    /// Write time seen at the last successful load, 0 when unknown
    pub file_last_write_time: u64,
    pub is_data_loaded: bool,
}

impl AssetMetadata {
    /// Fresh, unloaded metadata
    pub fn new(handle: AssetHandle, asset_type: AssetType, file_path: impl Into<PathBuf>) -> Self {
        Self {
            handle,
            asset_type,
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    /// Sentinel returned by failed lookups
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Lifecycle derived from status and load flag
    pub fn lifecycle(&self) -> AssetLifecycle {
        if !self.is_valid() {
            AssetLifecycle::Unregistered
        } else if self.is_data_loaded {
            AssetLifecycle::Loaded
        } else if self.status == AssetStatus::Loading {
            AssetLifecycle::Loading
        } else {
            AssetLifecycle::Registered
        }
    }
}

/// A finished background load waiting for adoption on the main thread
#[derive(Clone)]
pub struct EditorAssetLoadResponse {
    pub metadata: AssetMetadata,
    pub asset: AssetRef,
}

impl core::fmt::Debug for EditorAssetLoadResponse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EditorAssetLoadResponse")
            .field("metadata", &self.metadata)
            .field("asset", &self.asset.handle())
            .finish()
    }
}
