//! Editor Asset Manager - central asset access for the editor
//!
//! Resolves handles to live assets, owns the loaded-asset cache and the
//! registry file, drives the background [`EditorAssetSystem`] and exposes
//! the dependency API.
//!
//! The manager must be created on the main thread. Synchronous loads only
//! happen there; any other thread that asks for an unloaded asset is served
//! by the asset system instead, and its result is adopted into the cache at
//! the next [`EditorAssetManager::sync_with_asset_thread`].

use crate::asset::{downcast_asset, Asset, AssetRef, AsyncAssetResult};
use crate::config::AssetManagerConfig;
use crate::error::AssetResult;
use crate::fs;
use crate::handle::AssetHandle;
use crate::loader::AssetImporter;
use crate::metadata::{AssetLifecycle, AssetMetadata, AssetStatus};
use crate::registry::AssetRegistry;
use crate::storage::AssetDatabase;
use crate::system::EditorAssetSystem;
use crate::types::AssetType;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

/// Builds the stand-in returned while an asset loads in the background
pub type PlaceholderFactory = Arc<dyn Fn() -> AssetRef + Send + Sync>;

/// Event from the asset manager
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetEvent {
    /// Asset entered the loaded cache
    Loaded(AssetHandle),
    /// Cached asset was replaced with fresh data
    Reloaded(AssetHandle),
    /// Load attempt failed
    Failed(AssetHandle, String),
    /// Asset was removed from the manager
    Removed(AssetHandle),
    /// Backing file moved
    Renamed { handle: AssetHandle, path: PathBuf },
}

/// The editor's asset manager
pub struct EditorAssetManager {
    config: AssetManagerConfig,
    database: Arc<AssetDatabase>,
    /// Main-thread cache of disk assets
    loaded_assets: RwLock<HashMap<AssetHandle, AssetRef>>,
    asset_system: Option<EditorAssetSystem>,
    placeholders: RwLock<HashMap<AssetType, PlaceholderFactory>>,
    events: Mutex<Vec<AssetEvent>>,
    main_thread: ThreadId,
    shut_down: AtomicBool,
}

impl EditorAssetManager {
    /// Load the registry, start the asset thread and scan the asset directory.
    /// The calling thread becomes the main thread.
    pub fn new(config: AssetManagerConfig, importer: Arc<AssetImporter>) -> AssetResult<Self> {
        let database = Arc::new(AssetDatabase::new(
            config.asset_directory.clone(),
            importer,
            config.file_wait_timeout(),
        ));
        database.replace_registry(AssetRegistry::load_from_file(&config.registry_path));

        let asset_system = if config.async_assets {
            Some(EditorAssetSystem::new(Arc::clone(&database), &config)?)
        } else {
            None
        };

        let manager = Self {
            config,
            database,
            loaded_assets: RwLock::new(HashMap::new()),
            asset_system,
            placeholders: RwLock::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            main_thread: thread::current().id(),
            shut_down: AtomicBool::new(false),
        };

        if manager.config.scan_on_startup {
            manager.reload_assets();
        }

        log::info!(
            "Asset manager ready: {} registered assets in {}",
            manager.database.registry_snapshot().len(),
            manager.config.asset_directory.display()
        );

        Ok(manager)
    }

    /// Stop the asset thread and persist the registry. Runs once.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(system) = &self.asset_system {
            system.stop_and_wait();
        }
        self.write_registry_to_file();
        log::info!("Asset manager shut down");
    }

    pub fn config(&self) -> &AssetManagerConfig {
        &self.config
    }

    pub fn importer(&self) -> &Arc<AssetImporter> {
        self.database.importer()
    }

    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.main_thread
    }

    // ---- access ----

    /// Asset for a handle, `None` if unknown, failed or flagged invalid
    pub fn get_asset(&self, handle: AssetHandle) -> Option<AssetRef> {
        self.get_asset_including_invalid(handle)
            .filter(|asset| asset.is_valid())
    }

    /// Typed [`get_asset`](Self::get_asset)
    pub fn get_asset_as<T: Asset>(&self, handle: AssetHandle) -> Option<Arc<T>> {
        self.get_asset(handle).and_then(downcast_asset::<T>)
    }

    /// Like [`get_asset`](Self::get_asset) but also returns assets whose
    /// Missing or Invalid flag is set
    pub fn get_asset_including_invalid(&self, handle: AssetHandle) -> Option<AssetRef> {
        if let Some(asset) = self.database.memory_asset(handle) {
            return Some(asset);
        }

        let metadata = self.database.metadata(handle);
        if !metadata.is_valid() {
            return None;
        }

        if metadata.is_data_loaded {
            if let Some(asset) = self.loaded_assets.read().get(&handle).cloned() {
                return Some(asset);
            }
        }

        if !self.is_main_thread() {
            return match &self.asset_system {
                Some(system) => system.get_asset(&metadata),
                None => self.load_now(&metadata).map(|(asset, _)| asset),
            };
        }

        self.load_on_main_thread(&metadata)
    }

    /// Resident asset as ready, otherwise queue a background load and
    /// return the type's placeholder
    pub fn get_asset_async(&self, handle: AssetHandle) -> AsyncAssetResult {
        let Some(system) = &self.asset_system else {
            return AsyncAssetResult::ready(self.get_asset(handle));
        };

        if let Some(asset) = self.database.memory_asset(handle) {
            return AsyncAssetResult::ready(Some(asset));
        }

        let metadata = self.database.metadata(handle);
        if !metadata.is_valid() {
            return AsyncAssetResult::default();
        }

        if metadata.is_data_loaded {
            if let Some(asset) = self.loaded_assets.read().get(&handle).cloned() {
                return AsyncAssetResult::ready(Some(asset));
            }
        }

        if self.claim_for_loading(handle) {
            system.queue_asset_load(metadata.clone());
        }

        AsyncAssetResult::pending(self.placeholder_asset(metadata.asset_type))
    }

    /// Memory-only asset, without touching the registry
    pub fn memory_asset(&self, handle: AssetHandle) -> Option<AssetRef> {
        self.database.memory_asset(handle)
    }

    /// Store an asset that has no backing file, assigning a handle if needed
    pub fn add_memory_only_asset<A: Asset>(&self, mut asset: A) -> AssetHandle {
        if asset.handle().is_null() {
            asset.base_mut().set_handle(AssetHandle::generate());
        }
        let handle = asset.handle();
        self.database.add_memory_asset(Arc::new(asset));
        handle
    }

    // ---- validity ----

    pub fn is_asset_handle_valid(&self, handle: AssetHandle) -> bool {
        handle.is_valid() && (self.is_memory_asset(handle) || self.database.metadata(handle).is_valid())
    }

    /// Loads the asset if needed
    pub fn is_asset_valid(&self, handle: AssetHandle) -> bool {
        handle.is_valid()
            && self
                .get_asset_including_invalid(handle)
                .map_or(false, |asset| asset.is_valid())
    }

    /// Backing file is absent. Never loads; memory-only and unknown handles
    /// are not missing.
    pub fn is_asset_missing(&self, handle: AssetHandle) -> bool {
        if self.is_memory_asset(handle) {
            return false;
        }
        let metadata = self.database.metadata(handle);
        metadata.is_valid() && !self.file_exists(&metadata)
    }

    pub fn is_memory_asset(&self, handle: AssetHandle) -> bool {
        self.database.is_memory_asset(handle)
    }

    pub fn is_physical_asset(&self, handle: AssetHandle) -> bool {
        !self.is_memory_asset(handle) && self.database.metadata(handle).is_valid()
    }

    pub fn is_asset_loaded(&self, handle: AssetHandle) -> bool {
        self.loaded_assets.read().contains_key(&handle)
    }

    pub fn asset_lifecycle(&self, handle: AssetHandle) -> AssetLifecycle {
        if self.is_memory_asset(handle) {
            return AssetLifecycle::Loaded;
        }
        self.database.metadata(handle).lifecycle()
    }

    // ---- reloading ----

    /// Load fresh data now, replace the cached asset and notify dependents
    pub fn reload_data(&self, handle: AssetHandle) -> bool {
        let metadata = self.database.metadata(handle);
        if !metadata.is_valid() {
            log::error!("Cannot reload unknown asset {}", handle);
            return false;
        }

        match self.load_now(&metadata) {
            Some((asset, write_time)) => {
                let replaced = self.loaded_assets.write().insert(handle, asset).is_some();
                self.mark_loaded(handle, write_time);
                self.push_event(if replaced {
                    AssetEvent::Reloaded(handle)
                } else {
                    AssetEvent::Loaded(handle)
                });
                log::info!("Reloaded {}", metadata.file_path.display());
                self.update_dependents(handle);
                true
            }
            None => {
                self.mark_failed(&metadata);
                false
            }
        }
    }

    /// Queue a reload on the asset thread
    pub fn reload_data_async(&self, handle: AssetHandle) {
        let Some(system) = &self.asset_system else {
            self.reload_data(handle);
            return;
        };

        let metadata = self.database.metadata(handle);
        if !metadata.is_valid() {
            log::error!("Cannot reload unknown asset {}", handle);
            return;
        }

        self.database.update_metadata(handle, |m| m.status = AssetStatus::Loading);
        system.queue_asset_load(metadata);
    }

    /// Reload if the file's write time differs from the recorded one.
    /// Returns whether a reload happened.
    pub fn ensure_current(&self, handle: AssetHandle) -> bool {
        let metadata = self.database.metadata(handle);
        if !metadata.is_valid() {
            return false;
        }

        let path = self.database.file_system_path(&metadata);
        if !fs::exists(&path) {
            return false;
        }

        if fs::last_write_time(&path) == metadata.file_last_write_time {
            return false;
        }

        self.reload_data(handle)
    }

    /// [`ensure_current`](Self::ensure_current) for every loaded asset
    pub fn ensure_all_loaded_current(&self) -> bool {
        let handles: Vec<AssetHandle> = self.loaded_assets.read().keys().copied().collect();
        handles
            .into_iter()
            .fold(false, |changed, handle| self.ensure_current(handle) || changed)
    }

    // ---- dependencies ----

    pub fn register_dependency(&self, dependency: AssetHandle, dependent: AssetHandle) {
        self.database.register_dependency(dependency, dependent);
    }

    pub fn deregister_dependency(&self, dependency: AssetHandle, dependent: AssetHandle) {
        self.database.deregister_dependency(dependency, dependent);
    }

    pub fn deregister_dependencies(&self, dependent: AssetHandle) {
        self.database.deregister_dependencies(dependent);
    }

    /// Dependencies of `handle`, discovering them from the file on first use
    pub fn get_dependencies(&self, handle: AssetHandle) -> HashSet<AssetHandle> {
        if let Some(dependencies) = self.database.dependencies_of(handle) {
            return dependencies;
        }

        let metadata = self.database.metadata(handle);
        if metadata.is_valid() {
            self.database
                .importer()
                .register_dependencies(&metadata, &self.database);
        } else {
            self.database.ensure_dependency_entry(handle);
        }

        self.database.dependencies_of(handle).unwrap_or_default()
    }

    /// Assets that depend on `handle`
    pub fn get_dependents(&self, handle: AssetHandle) -> HashSet<AssetHandle> {
        self.database.dependents_of(handle)
    }

    /// Tell every loaded dependent of `handle` that it changed
    pub fn update_dependents(&self, handle: AssetHandle) {
        for dependent in self.database.dependents_of(handle) {
            let asset = self.loaded_assets.read().get(&dependent).cloned();
            if let Some(asset) = asset {
                asset.on_dependency_updated(handle);
            }
        }
    }

    // ---- asset thread ----

    /// Adopt finished background loads. Call once per frame on the main thread.
    ///
    /// The whole batch enters the cache and the asset thread's view of it
    /// before any dependent is notified.
    pub fn sync_with_asset_thread(&self) {
        let Some(system) = &self.asset_system else {
            return;
        };
        debug_assert!(self.is_main_thread(), "sync_with_asset_thread must run on the main thread");

        let mut fresh = Vec::new();
        system.retrieve_ready_assets(&mut fresh);

        let mut adopted = Vec::with_capacity(fresh.len());
        for response in fresh {
            let handle = response.metadata.handle;
            if !self.database.contains_metadata(handle) {
                log::debug!("Discarding background load of removed asset {}", handle);
                continue;
            }

            let replaced = self.loaded_assets.write().insert(handle, response.asset).is_some();
            self.mark_loaded(handle, response.metadata.file_last_write_time);
            self.push_event(if replaced {
                AssetEvent::Reloaded(handle)
            } else {
                AssetEvent::Loaded(handle)
            });
            adopted.push(handle);
        }

        let snapshot = self.loaded_assets.read().clone();
        system.update_loaded_asset_list(&snapshot);

        for handle in adopted {
            self.update_dependents(handle);
        }
    }

    pub fn is_asset_thread_busy(&self) -> bool {
        self.asset_system.as_ref().map_or(false, |system| system.is_busy())
    }

    /// Duration of the asset thread's last freshness scan
    pub fn asset_update_perf(&self) -> Duration {
        self.asset_system
            .as_ref()
            .map_or(Duration::ZERO, |system| system.last_scan_duration())
    }

    // ---- registry ----

    /// Register a file, or return its existing handle. Null for unknown
    /// extensions.
    pub fn import_asset(&self, path: impl AsRef<Path>) -> AssetHandle {
        let (handle, created) = self.import_asset_internal(path.as_ref());
        if created {
            self.write_registry_to_file();
        }
        handle
    }

    fn import_asset_internal(&self, path: &Path) -> (AssetHandle, bool) {
        let relative = self.database.relative_path(path);

        let existing = self.database.handle_from_path(&relative);
        if existing.is_valid() {
            return (existing, false);
        }

        let asset_type = AssetType::from_path(&relative);
        if asset_type == AssetType::None {
            return (AssetHandle::NULL, false);
        }

        let mut metadata = AssetMetadata::new(AssetHandle::generate(), asset_type, relative);
        metadata.file_last_write_time = fs::last_write_time(&self.database.file_system_path(&metadata));
        log::debug!("Imported {} as {}", metadata.file_path.display(), asset_type);

        let handle = metadata.handle;
        self.database.set_metadata(handle, metadata);
        (handle, true)
    }

    /// Import every recognised file under the asset directory, then persist
    pub fn reload_assets(&self) {
        let root = self.database.asset_directory().to_path_buf();
        if root.is_dir() {
            let mut imported = 0usize;
            self.scan_directory(&root, &mut imported);
            log::info!("Scanned {}: {} new assets", root.display(), imported);
        } else {
            log::warn!("Asset directory {} does not exist", root.display());
        }
        self.write_registry_to_file();
    }

    fn scan_directory(&self, dir: &Path, imported: &mut usize) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to read directory {}: {}", dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.scan_directory(&path, imported);
            } else if self.import_asset_internal(&path).1 {
                *imported += 1;
            }
        }
    }

    /// Persist the registry, skipping entries whose file is gone
    pub fn write_registry_to_file(&self) -> bool {
        let registry = self.database.registry_snapshot();
        let root = self.database.asset_directory().to_path_buf();
        registry
            .save_to_file(&self.config.registry_path, |meta| fs::exists(&root.join(&meta.file_path)))
            .is_ok()
    }

    /// Drop the asset from the memory map, the loaded cache, the registry
    /// and both directions of the dependency graph
    pub fn remove_asset(&self, handle: AssetHandle) {
        self.database.remove_memory_asset(handle);
        self.loaded_assets.write().remove(&handle);
        self.database.remove_metadata(handle);
        self.database.remove_from_dependency_graph(handle);
        self.push_event(AssetEvent::Removed(handle));
    }

    /// Backing file moved to `new_path`
    pub fn on_asset_renamed(&self, handle: AssetHandle, new_path: impl AsRef<Path>) {
        let relative = self.database.relative_path(new_path.as_ref());
        let updated = self
            .database
            .update_metadata(handle, |m| m.file_path = relative.clone())
            .is_some();

        if updated {
            self.push_event(AssetEvent::Renamed { handle, path: relative });
            self.write_registry_to_file();
        }
    }

    /// Backing file was deleted
    pub fn on_asset_deleted(&self, handle: AssetHandle) {
        self.remove_asset(handle);
        self.write_registry_to_file();
    }

    /// Cache `asset` under the handle for `path` (creating one if needed),
    /// write it through its serializer and notify dependents when it
    /// replaced an existing asset
    pub fn create_or_replace_asset<A: Asset>(&self, path: impl AsRef<Path>, mut asset: A) -> Arc<A> {
        let relative = self.database.relative_path(path.as_ref());
        let asset_type = asset.asset_type();

        let existing = self.database.handle_from_path(&relative);
        let mut metadata = self.database.metadata(existing);
        let created = !metadata.is_valid() || metadata.asset_type != asset_type;
        if created {
            if metadata.is_valid() {
                self.remove_asset(existing);
            }
            metadata = AssetMetadata::new(AssetHandle::generate(), asset_type, relative);
        }
        let handle = metadata.handle;

        asset.base_mut().set_handle(handle);
        let asset = Arc::new(asset);
        let shared: AssetRef = asset.clone();

        let replaced = self.loaded_assets.write().insert(handle, shared).is_some();
        self.database.set_metadata(handle, metadata.clone());
        self.database
            .importer()
            .serialize(&metadata, &*asset, &self.database);
        self.mark_loaded(handle, fs::last_write_time(&self.database.file_system_path(&metadata)));

        if replaced {
            self.push_event(AssetEvent::Reloaded(handle));
            self.update_dependents(handle);
        } else {
            self.push_event(AssetEvent::Loaded(handle));
        }

        if created {
            self.write_registry_to_file();
        }
        asset
    }

    /// Swap the cached object for a loaded asset
    pub fn replace_loaded_asset(&self, handle: AssetHandle, asset: AssetRef) -> bool {
        self.loaded_assets.write().insert(handle, asset).is_some()
    }

    /// Write a cached asset back through its serializer
    pub fn serialize_asset(&self, asset: &AssetRef) -> bool {
        let metadata = self.database.metadata(asset.handle());
        if !metadata.is_valid() {
            return false;
        }

        let saved = self
            .database
            .importer()
            .serialize(&metadata, &**asset, &self.database);
        if saved {
            // Our own write must not look like an external edit
            let write_time = fs::last_write_time(&self.database.file_system_path(&metadata));
            self.database
                .update_metadata(metadata.handle, |m| m.file_last_write_time = write_time);
        }
        saved
    }

    // ---- queries ----

    /// Metadata by value, or the null sentinel
    pub fn get_metadata(&self, handle: AssetHandle) -> AssetMetadata {
        self.database.metadata(handle)
    }

    pub fn set_metadata(&self, handle: AssetHandle, metadata: AssetMetadata) {
        self.database.set_metadata(handle, metadata);
    }

    pub fn get_asset_type(&self, handle: AssetHandle) -> AssetType {
        match self.database.memory_asset(handle) {
            Some(asset) => asset.asset_type(),
            None => self.database.metadata(handle).asset_type,
        }
    }

    /// Registered and memory-only assets of a type
    pub fn get_all_assets_with_type(&self, asset_type: AssetType) -> HashSet<AssetHandle> {
        let mut handles = self.database.registered_with_type(asset_type);
        handles.extend(self.database.memory_assets_with_type(asset_type));
        handles
    }

    pub fn get_loaded_assets(&self) -> HashMap<AssetHandle, AssetRef> {
        self.loaded_assets.read().clone()
    }

    pub fn get_memory_only_assets(&self) -> HashMap<AssetHandle, AssetRef> {
        self.database.memory_assets()
    }

    pub fn asset_handle_from_file_path(&self, path: impl AsRef<Path>) -> AssetHandle {
        self.database
            .handle_from_path(&self.database.relative_path(path.as_ref()))
    }

    pub fn file_system_path(&self, metadata: &AssetMetadata) -> PathBuf {
        self.database.file_system_path(metadata)
    }

    pub fn file_system_path_for(&self, handle: AssetHandle) -> PathBuf {
        self.database.file_system_path(&self.database.metadata(handle))
    }

    pub fn relative_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.database.relative_path(path.as_ref())
    }

    pub fn file_exists(&self, metadata: &AssetMetadata) -> bool {
        fs::exists(&self.database.file_system_path(metadata))
    }

    pub fn dependency_graph_consistent(&self) -> bool {
        self.database.dependency_graph_consistent()
    }

    // ---- placeholders and events ----

    /// Install the stand-in for a type
    pub fn register_placeholder(&self, asset_type: AssetType, factory: impl Fn() -> AssetRef + Send + Sync + 'static) {
        self.placeholders.write().insert(asset_type, Arc::new(factory));
    }

    pub fn placeholder_asset(&self, asset_type: AssetType) -> Option<AssetRef> {
        let factory = self.placeholders.read().get(&asset_type).cloned();
        factory.map(|make| make())
    }

    pub fn drain_events(&self) -> Vec<AssetEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    // ---- internals ----

    fn push_event(&self, event: AssetEvent) {
        self.events.lock().push(event);
    }

    /// Set status to Loading unless it already is; true if we flipped it
    fn claim_for_loading(&self, handle: AssetHandle) -> bool {
        self.database
            .update_metadata(handle, |m| {
                if m.status == AssetStatus::Loading {
                    false
                } else {
                    m.status = AssetStatus::Loading;
                    true
                }
            })
            .unwrap_or(false)
    }

    /// Run the serializer on this thread, returning the asset and the write
    /// time observed before reading
    fn load_now(&self, metadata: &AssetMetadata) -> Option<(AssetRef, u64)> {
        let write_time = fs::last_write_time(&self.database.file_system_path(metadata));
        self.database
            .importer()
            .try_load_data(metadata, &self.database)
            .map(|asset| (asset, write_time))
    }

    fn load_on_main_thread(&self, metadata: &AssetMetadata) -> Option<AssetRef> {
        let handle = metadata.handle;
        match self.load_now(metadata) {
            Some((asset, write_time)) => {
                self.loaded_assets.write().insert(handle, asset.clone());
                self.mark_loaded(handle, write_time);
                self.push_event(AssetEvent::Loaded(handle));
                log::info!("Loaded {}", metadata.file_path.display());
                Some(asset)
            }
            None => {
                self.mark_failed(metadata);
                None
            }
        }
    }

    fn mark_loaded(&self, handle: AssetHandle, write_time: u64) {
        self.database.update_metadata(handle, |m| {
            m.status = AssetStatus::Ready;
            m.is_data_loaded = true;
            m.file_last_write_time = write_time;
        });
    }

    fn mark_failed(&self, metadata: &AssetMetadata) {
        self.database
            .update_metadata(metadata.handle, |m| m.status = AssetStatus::Invalid);
        self.push_event(AssetEvent::Failed(
            metadata.handle,
            format!("failed to load {}", metadata.file_path.display()),
        ));
    }
}

impl Drop for EditorAssetManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl core::fmt::Debug for EditorAssetManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EditorAssetManager")
            .field("asset_directory", &self.config.asset_directory)
            .field("loaded", &self.loaded_assets.read().len())
            .field("async", &self.asset_system.is_some())
            .finish()
    }
}
