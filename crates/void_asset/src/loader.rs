//! Asset serializers and the importer that dispatches to them
//!
//! A serializer knows how to turn one [`AssetType`]'s file into an asset
//! object, write it back, and cheaply discover its dependencies. The
//! [`AssetImporter`] routes by `metadata.asset_type` so nothing else in the
//! pipeline has to match on the type.

use crate::asset::{Asset, AssetRef};
use crate::error::{AssetError, AssetResult};
use crate::fs;
use crate::handle::AssetHandle;
use crate::metadata::AssetMetadata;
use crate::storage::AssetDatabase;
use crate::types::AssetType;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Context handed to serializers
pub struct SerializerContext<'a> {
    metadata: &'a AssetMetadata,
    database: &'a AssetDatabase,
    path: PathBuf,
}

impl<'a> SerializerContext<'a> {
    pub fn new(metadata: &'a AssetMetadata, database: &'a AssetDatabase) -> Self {
        Self {
            metadata,
            database,
            path: database.file_system_path(metadata),
        }
    }

    pub fn metadata(&self) -> &AssetMetadata {
        self.metadata
    }

    /// Handle of the asset being processed
    pub fn handle(&self) -> AssetHandle {
        self.metadata.handle
    }

    /// Absolute path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercase extension without the dot
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    pub fn database(&self) -> &AssetDatabase {
        self.database
    }

    /// Read the backing file, waiting briefly if it is locked
    pub fn read_bytes(&self) -> AssetResult<Vec<u8>> {
        fs::read_bytes(&self.path, self.database.file_wait())
    }

    pub fn read_string(&self) -> AssetResult<String> {
        fs::read_string(&self.path, self.database.file_wait())
    }

    pub fn write_bytes(&self, bytes: &[u8]) -> AssetResult<()> {
        fs::write_bytes(&self.path, bytes)
    }

    /// Replace this asset's dependency set under a single lock
    pub fn set_dependencies(&self, dependencies: impl IntoIterator<Item = AssetHandle>) {
        self.database.replace_dependencies(self.metadata.handle, dependencies);
    }

    /// Store a sub-asset created during import (e.g. a mesh's materials)
    pub fn add_memory_only_asset<A: Asset>(&self, mut asset: A) -> AssetHandle {
        if asset.handle().is_null() {
            asset.base_mut().set_handle(AssetHandle::generate());
        }
        let handle = asset.handle();
        self.database.add_memory_asset(Arc::new(asset));
        handle
    }

    /// Handle for the `index`-th sub-asset this file produces. Reloads get
    /// the same handles back, so sub-assets are replaced rather than added.
    pub fn sub_asset_handle(&self, index: u64) -> AssetHandle {
        self.metadata.handle.derive(index)
    }

    /// Drop a sub-asset stored by an earlier load; false if it was not there
    pub fn remove_memory_only_asset(&self, handle: AssetHandle) -> bool {
        self.database.remove_memory_asset(handle).is_some()
    }

    /// Parse error tagged with this file
    pub fn parse_error(&self, message: impl Into<String>) -> AssetError {
        AssetError::parse(&self.path, message)
    }
}

/// Per-type load/save strategy
pub trait AssetSerializer: Send + Sync {
    /// Write the in-memory asset back to its file. No-op by default.
    fn serialize(&self, ctx: &SerializerContext, asset: &dyn Asset) -> AssetResult<()> {
        let _ = (ctx, asset);
        Ok(())
    }

    /// Build the asset from its file
    fn try_load_data(&self, ctx: &SerializerContext) -> AssetResult<AssetRef>;

    /// Dependencies read from the file without a full load. The default
    /// reports none, which still marks the asset as registered.
    fn discover_dependencies(&self, ctx: &SerializerContext) -> AssetResult<Vec<AssetHandle>> {
        let _ = ctx;
        Ok(Vec::new())
    }
}

/// Dispatch table from asset type to serializer
#[derive(Default)]
pub struct AssetImporter {
    serializers: RwLock<HashMap<AssetType, Arc<dyn AssetSerializer>>>,
}

impl AssetImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole table
    pub fn init(&self, serializers: impl IntoIterator<Item = (AssetType, Arc<dyn AssetSerializer>)>) {
        let mut table = self.serializers.write();
        table.clear();
        table.extend(serializers);
        log::debug!("Asset importer initialised with {} serializers", table.len());
    }

    /// Install or replace the serializer for one type
    pub fn register<S: AssetSerializer + 'static>(&self, asset_type: AssetType, serializer: S) {
        self.serializers.write().insert(asset_type, Arc::new(serializer));
    }

    pub fn has_serializer(&self, asset_type: AssetType) -> bool {
        self.serializers.read().contains_key(&asset_type)
    }

    /// The lock is released before the serializer runs
    pub fn serializer_for(&self, asset_type: AssetType) -> AssetResult<Arc<dyn AssetSerializer>> {
        self.serializers
            .read()
            .get(&asset_type)
            .cloned()
            .ok_or(AssetError::NoSerializer(asset_type))
    }

    fn serializer_or_warn(&self, asset_type: AssetType) -> Option<Arc<dyn AssetSerializer>> {
        self.serializer_for(asset_type)
            .map_err(|e| log::warn!("{}", e))
            .ok()
    }

    /// Save an asset through its serializer; failures are logged
    pub fn serialize(&self, metadata: &AssetMetadata, asset: &dyn Asset, database: &AssetDatabase) -> bool {
        let Some(serializer) = self.serializer_or_warn(metadata.asset_type) else {
            return false;
        };

        let ctx = SerializerContext::new(metadata, database);
        match serializer.serialize(&ctx, asset) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to serialize {}: {}", metadata.file_path.display(), e);
                false
            }
        }
    }

    /// Load an asset; `None` on any failure
    pub fn try_load_data(&self, metadata: &AssetMetadata, database: &AssetDatabase) -> Option<AssetRef> {
        let serializer = self.serializer_or_warn(metadata.asset_type)?;

        let ctx = SerializerContext::new(metadata, database);
        match serializer.try_load_data(&ctx) {
            Ok(asset) if asset.handle() == metadata.handle => Some(asset),
            Ok(asset) => {
                log::error!(
                    "Serializer for {} produced handle {} instead of {}",
                    metadata.asset_type,
                    asset.handle(),
                    metadata.handle
                );
                None
            }
            Err(e) => {
                log::error!("Failed to load {} ({}): {}", metadata.file_path.display(), metadata.handle, e);
                None
            }
        }
    }

    /// Discover dependencies and merge them into the graph in one step
    pub fn register_dependencies(&self, metadata: &AssetMetadata, database: &AssetDatabase) {
        let Some(serializer) = self.serializer_or_warn(metadata.asset_type) else {
            return;
        };

        let ctx = SerializerContext::new(metadata, database);
        match serializer.discover_dependencies(&ctx) {
            Ok(dependencies) => database.replace_dependencies(metadata.handle, dependencies),
            Err(e) => log::warn!(
                "Failed to discover dependencies of {}: {}",
                metadata.file_path.display(),
                e
            ),
        }
    }
}

impl core::fmt::Debug for AssetImporter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut types: Vec<AssetType> = self.serializers.read().keys().copied().collect();
        types.sort();
        f.debug_struct("AssetImporter").field("types", &types).finish()
    }
}
