//! Asset Handle - Stable identity for an asset
//!
//! Handles are random 128-bit identifiers that stay the same when the
//! backing file moves. A zero handle means "no asset".

use core::fmt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an asset
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetHandle(u128);

impl AssetHandle {
    /// The null handle
    pub const NULL: Self = Self(0);

    /// Generate a fresh random handle
    pub fn generate() -> Self {
        loop {
            let value = Uuid::new_v4().as_u128();
            if value != 0 {
                return Self(value);
            }
        }
    }

    /// Create from a raw 128-bit value
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// Create from a 64-bit value (older registries store 64-bit handles)
    pub const fn from_u64(value: u64) -> Self {
        Self(value as u128)
    }

    /// Raw 128-bit value
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Check for the null handle
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Check for a non-null handle
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Stable handle for the `index`-th sub-asset of this one. The same
    /// parent and index always give the same non-null handle.
    pub fn derive(&self, index: u64) -> Self {
        let mut value = self.0 ^ (index as u128 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15_f39c_c060_5ced_c835);
        value ^= value >> 67;
        value = value.wrapping_mul(0x2545_f491_4f6c_dd1d_6a09_e667_f3bc_c909);
        value ^= value >> 61;
        Self(value.max(1))
    }

    /// Parse the hyphenated or simple UUID text form
    pub fn parse_str(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(|uuid| Self(uuid.as_u128()))
    }
}

impl From<u128> for AssetHandle {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<u64> for AssetHandle {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<Uuid> for AssetHandle {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.as_u128())
    }
}

impl From<AssetHandle> for u128 {
    fn from(handle: AssetHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_u128(self.0).hyphenated())
    }
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetHandle({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_unique() {
        let handles: HashSet<AssetHandle> = (0..100).map(|_| AssetHandle::generate()).collect();
        assert_eq!(handles.len(), 100);
        assert!(handles.iter().all(|h| h.is_valid()));
    }

    #[test]
    fn test_null_handle() {
        assert!(AssetHandle::NULL.is_null());
        assert_eq!(AssetHandle::default(), AssetHandle::NULL);
        assert!(AssetHandle::from_u64(7).is_valid());
    }

    #[test]
    fn test_derive_is_stable() {
        let parent = AssetHandle::generate();
        let children: HashSet<AssetHandle> = (0..16).map(|i| parent.derive(i)).collect();
        assert_eq!(children.len(), 16);
        assert!(!children.contains(&parent));
        assert!(children.iter().all(|h| h.is_valid()));
        assert_eq!(parent.derive(3), parent.derive(3));
        assert_ne!(parent.derive(0), AssetHandle::generate().derive(0));
        assert!(AssetHandle::NULL.derive(0).is_valid());
    }

    #[test]
    fn test_string_form() {
        let handle = AssetHandle::generate();
        let text = handle.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(AssetHandle::parse_str(&text), Some(handle));
        assert_eq!(AssetHandle::parse_str("not-a-uuid"), None);
    }

    #[test]
    fn test_serde_as_integer() {
        let handle = AssetHandle::from_u64(42);
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, "42");
        let back: AssetHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }
}
