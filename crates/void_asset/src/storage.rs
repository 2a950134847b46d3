//! Asset Database - state shared between the main thread and the asset thread
//!
//! Three independent reader-writer locks guard the registry, the
//! memory-only assets and the dependency graph. Every method takes at most
//! one of them and releases it before returning, so no two are ever held
//! together and no lock is held across serializer code.

use crate::asset::AssetRef;
use crate::dependency::DependencyGraph;
use crate::handle::AssetHandle;
use crate::loader::AssetImporter;
use crate::metadata::AssetMetadata;
use crate::registry::AssetRegistry;
use crate::types::AssetType;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct AssetDatabase {
    asset_directory: PathBuf,
    file_wait: Duration,
    importer: Arc<AssetImporter>,
    registry: RwLock<AssetRegistry>,
    memory_assets: RwLock<HashMap<AssetHandle, AssetRef>>,
    dependencies: RwLock<DependencyGraph>,
}

impl AssetDatabase {
    pub fn new(asset_directory: impl Into<PathBuf>, importer: Arc<AssetImporter>, file_wait: Duration) -> Self {
        Self {
            asset_directory: asset_directory.into(),
            file_wait,
            importer,
            registry: RwLock::new(AssetRegistry::new()),
            memory_assets: RwLock::new(HashMap::new()),
            dependencies: RwLock::new(DependencyGraph::new()),
        }
    }

    pub fn asset_directory(&self) -> &Path {
        &self.asset_directory
    }

    /// How long file opens wait for a lock to clear
    pub fn file_wait(&self) -> Duration {
        self.file_wait
    }

    pub fn importer(&self) -> &Arc<AssetImporter> {
        &self.importer
    }

    // ---- registry ----

    /// Metadata by value, or the null sentinel
    pub fn metadata(&self, handle: AssetHandle) -> AssetMetadata {
        self.registry.read().get(handle).unwrap_or_default()
    }

    pub fn set_metadata(&self, handle: AssetHandle, metadata: AssetMetadata) {
        self.registry.write().set(handle, metadata);
    }

    /// Read-modify-write of one entry under the registry lock
    pub fn update_metadata<R>(&self, handle: AssetHandle, f: impl FnOnce(&mut AssetMetadata) -> R) -> Option<R> {
        self.registry.write().update(handle, f)
    }

    pub fn contains_metadata(&self, handle: AssetHandle) -> bool {
        self.registry.read().contains(handle)
    }

    pub fn remove_metadata(&self, handle: AssetHandle) -> Option<AssetMetadata> {
        self.registry.write().remove(handle)
    }

    /// Swap in a freshly loaded registry
    pub fn replace_registry(&self, registry: AssetRegistry) {
        *self.registry.write() = registry;
    }

    pub fn registry_snapshot(&self) -> AssetRegistry {
        self.registry.read().clone()
    }

    /// Handle registered for a relative path, or null
    pub fn handle_from_path(&self, relative_path: &Path) -> AssetHandle {
        self.registry
            .read()
            .find_by_path(relative_path)
            .unwrap_or(AssetHandle::NULL)
    }

    pub fn registered_with_type(&self, asset_type: AssetType) -> HashSet<AssetHandle> {
        self.registry
            .read()
            .iter()
            .filter(|(_, meta)| meta.asset_type == asset_type)
            .map(|(handle, _)| *handle)
            .collect()
    }

    // ---- memory-only assets ----

    pub fn memory_asset(&self, handle: AssetHandle) -> Option<AssetRef> {
        self.memory_assets.read().get(&handle).cloned()
    }

    pub fn is_memory_asset(&self, handle: AssetHandle) -> bool {
        self.memory_assets.read().contains_key(&handle)
    }

    /// Store an asset that has no backing file. The handle must already be set.
    pub fn add_memory_asset(&self, asset: AssetRef) {
        let handle = asset.handle();
        debug_assert!(handle.is_valid(), "memory asset needs a handle");
        if handle.is_null() {
            log::error!("Refusing to store a memory-only asset without a handle");
            return;
        }
        self.memory_assets.write().insert(handle, asset);
    }

    pub fn remove_memory_asset(&self, handle: AssetHandle) -> Option<AssetRef> {
        self.memory_assets.write().remove(&handle)
    }

    pub fn memory_assets(&self) -> HashMap<AssetHandle, AssetRef> {
        self.memory_assets.read().clone()
    }

    pub fn memory_assets_with_type(&self, asset_type: AssetType) -> HashSet<AssetHandle> {
        self.memory_assets
            .read()
            .iter()
            .filter(|(_, asset)| asset.asset_type() == asset_type)
            .map(|(handle, _)| *handle)
            .collect()
    }

    // ---- dependency graph ----

    pub fn register_dependency(&self, dependency: AssetHandle, dependent: AssetHandle) {
        self.dependencies.write().register(dependency, dependent);
    }

    pub fn deregister_dependency(&self, dependency: AssetHandle, dependent: AssetHandle) {
        self.dependencies.write().deregister(dependency, dependent);
    }

    pub fn deregister_dependencies(&self, dependent: AssetHandle) {
        self.dependencies.write().deregister_all(dependent);
    }

    pub fn replace_dependencies(&self, dependent: AssetHandle, dependencies: impl IntoIterator<Item = AssetHandle>) {
        self.dependencies.write().replace(dependent, dependencies);
    }

    pub fn ensure_dependency_entry(&self, dependent: AssetHandle) {
        self.dependencies.write().ensure_registered(dependent);
    }

    /// `None` until the dependent's dependencies have been registered
    pub fn dependencies_of(&self, dependent: AssetHandle) -> Option<HashSet<AssetHandle>> {
        self.dependencies.read().dependencies_of(dependent)
    }

    pub fn dependents_of(&self, dependency: AssetHandle) -> HashSet<AssetHandle> {
        self.dependencies.read().dependents_of(dependency)
    }

    pub fn remove_from_dependency_graph(&self, handle: AssetHandle) {
        self.dependencies.write().remove_asset(handle);
    }

    pub fn dependency_graph_consistent(&self) -> bool {
        self.dependencies.read().is_consistent()
    }

    // ---- paths ----

    /// Absolute location of a disk asset
    pub fn file_system_path(&self, metadata: &AssetMetadata) -> PathBuf {
        self.asset_directory.join(&metadata.file_path)
    }

    /// Path relative to the asset directory. Paths outside it are only
    /// normalised.
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        let normalized = normalize_lexically(path);
        let root = normalize_lexically(&self.asset_directory);
        match normalized.strip_prefix(&root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => normalized,
        }
    }
}

/// Resolve `.` and `..` without touching the file system
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
