//! Editor Asset System - the background asset thread
//!
//! One worker thread drains a channel of load requests and, every
//! `monitor_interval`, compares the recorded write time of each asset the
//! main thread has loaded with the file on disk, queuing a reload when they
//! differ. Finished loads are staged until the main thread adopts them at a
//! sync point with [`EditorAssetSystem::retrieve_ready_assets`].
//!
//! The system is also a synchronous loading service for threads other than
//! the main thread. Concurrent requests for the same cold handle share one
//! load: the first caller loads, later callers block until it finishes.

use crate::asset::AssetRef;
use crate::config::AssetManagerConfig;
use crate::error::{AssetError, AssetResult};
use crate::fs;
use crate::handle::AssetHandle;
use crate::metadata::{AssetMetadata, AssetStatus, EditorAssetLoadResponse};
use crate::storage::AssetDatabase;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[cfg(feature = "hot-reload")]
use crate::watcher::AssetDirectoryWatcher;

/// Message consumed by the asset thread
#[derive(Debug)]
enum AssetThreadRequest {
    Load(AssetMetadata),
    /// Run a freshness scan now
    Wake,
}

/// A load one thread is running and others may wait on
struct InFlightLoad {
    result: Mutex<Option<Option<AssetRef>>>,
    ready: Condvar,
}

impl InFlightLoad {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn complete(&self, asset: Option<AssetRef>) {
        *self.result.lock() = Some(asset);
        self.ready.notify_all();
    }

    fn wait(&self) -> Option<AssetRef> {
        let mut result = self.result.lock();
        while result.is_none() {
            self.ready.wait(&mut result);
        }
        result.clone().flatten()
    }
}

#[derive(Default)]
struct LoadState {
    /// Finished loads awaiting adoption
    ready: Vec<EditorAssetLoadResponse>,
    in_flight: HashMap<AssetHandle, Arc<InFlightLoad>>,
}

enum Claim {
    Ready(AssetRef),
    Wait(Arc<InFlightLoad>),
    Load(Arc<InFlightLoad>),
}

struct AssetSystemShared {
    database: Arc<AssetDatabase>,
    requests: Sender<AssetThreadRequest>,
    running: AtomicBool,
    busy: AtomicBool,
    monitor_interval: Duration,
    last_scan_micros: AtomicU64,
    loads: Mutex<LoadState>,
    /// The main thread's loaded-asset cache as last pushed to us
    main_loaded: RwLock<HashMap<AssetHandle, AssetRef>>,
}

/// Background asset loading thread
pub struct EditorAssetSystem {
    shared: Arc<AssetSystemShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
    #[cfg(feature = "hot-reload")]
    _watcher: Mutex<Option<AssetDirectoryWatcher>>,
}

impl EditorAssetSystem {
    /// Spawn the asset thread
    pub fn new(database: Arc<AssetDatabase>, config: &AssetManagerConfig) -> AssetResult<Self> {
        let (requests, receiver) = crossbeam_channel::unbounded();

        let shared = Arc::new(AssetSystemShared {
            database,
            requests,
            running: AtomicBool::new(true),
            busy: AtomicBool::new(false),
            monitor_interval: config.monitor_interval(),
            last_scan_micros: AtomicU64::new(0),
            loads: Mutex::new(LoadState::default()),
            main_loaded: RwLock::new(HashMap::new()),
        });

        let worker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("Asset Thread".to_string())
            .spawn(move || worker.run(receiver))
            .map_err(AssetError::Thread)?;

        log::info!("Asset thread started");

        #[cfg(feature = "hot-reload")]
        let watcher = if config.hot_reload {
            Self::install_watcher(&shared)
        } else {
            None
        };

        Ok(Self {
            shared,
            thread: Mutex::new(Some(handle)),
            #[cfg(feature = "hot-reload")]
            _watcher: Mutex::new(watcher),
        })
    }

    #[cfg(feature = "hot-reload")]
    fn install_watcher(shared: &Arc<AssetSystemShared>) -> Option<AssetDirectoryWatcher> {
        let requests = shared.requests.clone();
        let root = shared.database.asset_directory().to_path_buf();
        match AssetDirectoryWatcher::new(&root, move |path| {
            log::trace!("Asset file touched: {}", path.display());
            let _ = requests.send(AssetThreadRequest::Wake);
        }) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                log::warn!("Hot reload disabled: {}", e);
                None
            }
        }
    }

    /// Queue a background load
    pub fn queue_asset_load(&self, metadata: AssetMetadata) {
        log::debug!("Queueing load of {}", metadata.file_path.display());
        if self.shared.requests.send(AssetThreadRequest::Load(metadata)).is_err() {
            log::warn!("Asset thread is gone, dropping load request");
        }
    }

    /// Load on the calling thread (never the main thread), reusing the main
    /// thread's cache, staged results, or a load already in flight
    pub fn get_asset(&self, metadata: &AssetMetadata) -> Option<AssetRef> {
        if let Some(asset) = self.shared.main_loaded.read().get(&metadata.handle).cloned() {
            return Some(asset);
        }
        self.shared.load_shared(metadata, true)
    }

    /// Move all staged results into `out`; true if there were any
    pub fn retrieve_ready_assets(&self, out: &mut Vec<EditorAssetLoadResponse>) -> bool {
        debug_assert!(out.is_empty(), "retrieve_ready_assets expects an empty output list");
        let mut loads = self.shared.loads.lock();
        let retrieved = !loads.ready.is_empty();
        out.append(&mut loads.ready);
        retrieved
    }

    /// Replace the list of assets the freshness scan watches
    pub fn update_loaded_asset_list(&self, loaded_assets: &HashMap<AssetHandle, AssetRef>) {
        *self.shared.main_loaded.write() = loaded_assets.clone();
    }

    /// Scanning or loading right now
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Duration of the most recent freshness scan
    pub fn last_scan_duration(&self) -> Duration {
        Duration::from_micros(self.shared.last_scan_micros.load(Ordering::Relaxed))
    }

    /// Ask the thread to exit after its current item
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        let _ = self.shared.requests.send(AssetThreadRequest::Wake);
    }

    /// Stop and join
    pub fn stop_and_wait(&self) {
        self.stop();
        if let Some(handle) = self.thread.lock().take() {
            if handle.join().is_err() {
                log::error!("Asset thread panicked");
            }
        }
    }
}

impl Drop for EditorAssetSystem {
    fn drop(&mut self) {
        self.stop_and_wait();
    }
}

impl AssetSystemShared {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn run(self: Arc<Self>, receiver: Receiver<AssetThreadRequest>) {
        let mut pending: VecDeque<AssetMetadata> = VecDeque::new();

        while self.is_running() {
            self.busy.store(true, Ordering::Release);

            let started = Instant::now();
            self.ensure_all_loaded_current();
            let elapsed = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            self.last_scan_micros.store(elapsed, Ordering::Relaxed);

            pending.extend(receiver.try_iter().filter_map(|request| match request {
                AssetThreadRequest::Load(metadata) => Some(metadata),
                AssetThreadRequest::Wake => None,
            }));

            while self.is_running() {
                let Some(metadata) = pending.pop_front() else {
                    break;
                };
                self.process_load(&metadata);
            }

            self.busy.store(false, Ordering::Release);
            if !self.is_running() {
                break;
            }

            match receiver.recv_timeout(self.monitor_interval) {
                Ok(AssetThreadRequest::Load(metadata)) => pending.push_back(metadata),
                Ok(AssetThreadRequest::Wake) | Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        log::info!("Asset thread stopped");
    }

    fn process_load(&self, queued: &AssetMetadata) {
        // The registry entry may have moved or vanished since queuing
        let metadata = self.database.metadata(queued.handle);
        if !metadata.is_valid() {
            log::debug!("Dropping load of removed asset {}", queued.handle);
            return;
        }

        if self.load_shared(&metadata, false).is_some() {
            log::info!("Loaded {} on the asset thread", metadata.file_path.display());
        }
    }

    fn ensure_all_loaded_current(&self) {
        let handles: Vec<AssetHandle> = self.main_loaded.read().keys().copied().collect();
        for handle in handles {
            if !self.is_running() {
                return;
            }
            self.ensure_current(handle);
        }
    }

    /// Queue a reload when the file's write time moved away from the
    /// recorded one. Unknown (zero) timestamps never trigger a reload.
    fn ensure_current(&self, handle: AssetHandle) {
        let metadata = self.database.metadata(handle);
        if !metadata.is_valid() || metadata.status == AssetStatus::Loading {
            return;
        }

        let recorded = metadata.file_last_write_time;
        let actual = fs::last_write_time(&self.database.file_system_path(&metadata));
        if recorded == 0 || actual == 0 || recorded == actual {
            return;
        }

        let claimed = self
            .database
            .update_metadata(handle, |m| {
                if m.status == AssetStatus::Loading {
                    false
                } else {
                    m.status = AssetStatus::Loading;
                    true
                }
            })
            .unwrap_or(false);

        if claimed {
            log::info!("{} changed on disk, reloading", metadata.file_path.display());
            let _ = self.requests.send(AssetThreadRequest::Load(metadata));
        }
    }

    /// Load with per-handle deduplication. `reuse_ready` lets a staged but
    /// not yet adopted result satisfy the request.
    fn load_shared(&self, metadata: &AssetMetadata, reuse_ready: bool) -> Option<AssetRef> {
        let handle = metadata.handle;

        let claim = {
            let mut loads = self.loads.lock();
            let staged = if reuse_ready {
                loads
                    .ready
                    .iter()
                    .find(|response| response.metadata.handle == handle)
                    .map(|response| response.asset.clone())
            } else {
                None
            };

            if let Some(asset) = staged {
                Claim::Ready(asset)
            } else if let Some(slot) = loads.in_flight.get(&handle) {
                Claim::Wait(Arc::clone(slot))
            } else {
                let slot = Arc::new(InFlightLoad::new());
                loads.in_flight.insert(handle, Arc::clone(&slot));
                Claim::Load(slot)
            }
        };

        match claim {
            Claim::Ready(asset) => Some(asset),
            Claim::Wait(slot) => slot.wait(),
            Claim::Load(slot) => {
                let response = self.try_load_data(metadata);
                let asset = response.as_ref().map(|r| r.asset.clone());
                {
                    let mut loads = self.loads.lock();
                    if let Some(response) = response {
                        loads.ready.retain(|staged| staged.metadata.handle != handle);
                        loads.ready.push(response);
                    }
                    loads.in_flight.remove(&handle);
                }
                slot.complete(asset.clone());
                asset
            }
        }
    }

    fn try_load_data(&self, metadata: &AssetMetadata) -> Option<EditorAssetLoadResponse> {
        let path = self.database.file_system_path(metadata);
        if !fs::exists(&path) {
            log::error!("Cannot load {}: file does not exist", path.display());
            self.mark_failed(metadata.handle);
            return None;
        }

        // Taken before reading so an edit made mid-load is caught by the next scan
        let write_time = fs::last_write_time(&path);

        let Some(asset) = self.database.importer().try_load_data(metadata, &self.database) else {
            self.mark_failed(metadata.handle);
            return None;
        };

        let mut loaded = metadata.clone();
        loaded.file_last_write_time = write_time;
        loaded.status = AssetStatus::Ready;
        loaded.is_data_loaded = true;

        Some(EditorAssetLoadResponse {
            metadata: loaded,
            asset,
        })
    }

    fn mark_failed(&self, handle: AssetHandle) {
        self.database.update_metadata(handle, |m| m.status = AssetStatus::Invalid);
    }
}
