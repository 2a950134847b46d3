//! # void_asset - Editor Asset Management
//!
//! Asset identity, persistence and loading for the editor:
//! - Stable 128-bit handles and a JSON asset registry
//! - Per-type serializers behind an importer dispatch table
//! - A dependency graph with change notification
//! - A background asset thread that loads off the main thread and
//!   reloads assets whose files change on disk
//!
//! ## Example
//!
//! ```ignore
//! use void_asset::prelude::*;
//!
//! let importer = Arc::new(AssetImporter::new());
//! importer.register(AssetType::Texture, MyTextureSerializer);
//!
//! let manager = EditorAssetManager::new(AssetManagerConfig::for_project("my_game"), importer)?;
//! let handle = manager.import_asset("my_game/assets/textures/grass.png");
//!
//! // Non-blocking: placeholder now, real texture after a later sync
//! let result = manager.get_asset_async(handle);
//!
//! // Once per frame
//! manager.sync_with_asset_thread();
//! ```

pub mod asset;
pub mod config;
pub mod dependency;
pub mod error;
pub mod fs;
pub mod handle;
pub mod loader;
pub mod manager;
pub mod metadata;
pub mod registry;
pub mod storage;
pub mod system;
pub mod types;

#[cfg(feature = "hot-reload")]
pub mod watcher;

pub use asset::{downcast_asset, AsAny, Asset, AssetBase, AssetFlag, AssetRef, AsyncAssetResult};
pub use config::AssetManagerConfig;
pub use dependency::DependencyGraph;
pub use error::{AssetError, AssetResult};
pub use handle::AssetHandle;
pub use loader::{AssetImporter, AssetSerializer, SerializerContext};
pub use manager::{AssetEvent, EditorAssetManager, PlaceholderFactory};
pub use metadata::{AssetLifecycle, AssetMetadata, AssetStatus, EditorAssetLoadResponse};
pub use registry::AssetRegistry;
pub use storage::AssetDatabase;
pub use system::EditorAssetSystem;
pub use types::AssetType;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::asset::{downcast_asset, Asset, AssetBase, AssetFlag, AssetRef, AsyncAssetResult};
    pub use crate::config::AssetManagerConfig;
    pub use crate::error::{AssetError, AssetResult};
    pub use crate::handle::AssetHandle;
    pub use crate::loader::{AssetImporter, AssetSerializer, SerializerContext};
    pub use crate::manager::{AssetEvent, EditorAssetManager};
    pub use crate::metadata::{AssetMetadata, AssetStatus};
    pub use crate::types::AssetType;
    pub use std::sync::Arc;
}
