//! Asset - Shared, polymorphic asset objects
//!
//! Every concrete asset embeds an [`AssetBase`] carrying its handle and
//! validity flags. Assets are shared as [`AssetRef`] (`Arc<dyn Asset>`);
//! the pipeline replaces them wholesale on reload and never mutates their
//! content, so flags use atomics to stay settable through a shared reference.

use crate::handle::AssetHandle;
use crate::types::AssetType;
use std::any::Any;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// Validity flags
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum AssetFlag {
    /// Backing file is gone
    Missing = 1 << 0,
    /// Content failed validation
    Invalid = 1 << 1,
}

/// Identity and flags shared by all assets
#[derive(Debug, Default)]
pub struct AssetBase {
    handle: AssetHandle,
    flags: AtomicU16,
}

impl AssetBase {
    /// Create with a handle and no flags
    pub fn new(handle: AssetHandle) -> Self {
        Self {
            handle,
            flags: AtomicU16::new(0),
        }
    }

    pub fn handle(&self) -> AssetHandle {
        self.handle
    }

    pub fn set_handle(&mut self, handle: AssetHandle) {
        self.handle = handle;
    }

    /// Check a single flag
    pub fn is_flag_set(&self, flag: AssetFlag) -> bool {
        self.flags.load(Ordering::Acquire) & flag as u16 != 0
    }

    /// Set or clear a flag
    pub fn set_flag(&self, flag: AssetFlag, value: bool) {
        if value {
            self.flags.fetch_or(flag as u16, Ordering::AcqRel);
        } else {
            self.flags.fetch_and(!(flag as u16), Ordering::AcqRel);
        }
    }

    /// Neither Missing nor Invalid
    pub fn is_valid(&self) -> bool {
        self.flags.load(Ordering::Acquire) & (AssetFlag::Missing as u16 | AssetFlag::Invalid as u16) == 0
    }
}

impl Clone for AssetBase {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            flags: AtomicU16::new(self.flags.load(Ordering::Acquire)),
        }
    }
}

/// Upcast helper for downcasting trait objects
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Common capability set of every asset
pub trait Asset: AsAny {
    fn base(&self) -> &AssetBase;

    fn base_mut(&mut self) -> &mut AssetBase;

    /// Type discriminant
    fn asset_type(&self) -> AssetType;

    /// Called on a loaded dependent after one of its dependencies was
    /// (re)loaded. Implementations mark themselves stale or re-derive data.
    fn on_dependency_updated(&self, _dependency: AssetHandle) {}

    fn handle(&self) -> AssetHandle {
        self.base().handle()
    }

    fn is_valid(&self) -> bool {
        self.base().is_valid()
    }
}

impl dyn Asset {
    /// Borrow as a concrete type
    pub fn downcast_ref<T: Asset>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Check the concrete type
    pub fn is<T: Asset>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Shared asset reference
pub type AssetRef = Arc<dyn Asset>;

/// Convert a shared asset into its concrete type
pub fn downcast_asset<T: Asset>(asset: AssetRef) -> Option<Arc<T>> {
    asset.into_any_arc().downcast::<T>().ok()
}

/// Result of a non-blocking asset request
#[derive(Clone, Default)]
pub struct AsyncAssetResult {
    /// Real asset when ready, otherwise a placeholder (if one exists)
    pub asset: Option<AssetRef>,
    pub is_ready: bool,
}

impl AsyncAssetResult {
    pub fn ready(asset: Option<AssetRef>) -> Self {
        Self {
            asset,
            is_ready: true,
        }
    }

    pub fn pending(placeholder: Option<AssetRef>) -> Self {
        Self {
            asset: placeholder,
            is_ready: false,
        }
    }
}

impl core::fmt::Debug for AsyncAssetResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AsyncAssetResult")
            .field("asset", &self.asset.as_ref().map(|a| a.handle()))
            .field("is_ready", &self.is_ready)
            .finish()
    }
}
