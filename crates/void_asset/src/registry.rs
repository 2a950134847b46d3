//! Asset Registry - handle to metadata map and its JSON file
//!
//! The registry has no locking of its own; the owner wraps it in a lock.
//! File layout:
//!
//! ```json
//! { "Assets": [ { "Handle": 1234, "FilePath": "textures/a.png", "Type": "Texture" } ] }
//! ```
//!
//! Only handle, path and type are persisted. Status, load flag and write
//! time are recomputed at runtime.

use crate::error::{AssetError, AssetResult};
use crate::handle::AssetHandle;
use crate::metadata::AssetMetadata;
use crate::types::AssetType;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mapping from handle to metadata for every imported disk asset
#[derive(Clone, Debug, Default)]
pub struct AssetRegistry {
    entries: HashMap<AssetHandle, AssetMetadata>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata by value
    pub fn get(&self, handle: AssetHandle) -> Option<AssetMetadata> {
        self.entries.get(&handle).cloned()
    }

    /// Insert or overwrite. The handle must be non-null and match the metadata.
    pub fn set(&mut self, handle: AssetHandle, metadata: AssetMetadata) {
        debug_assert!(handle.is_valid(), "registry handle must not be null");
        debug_assert_eq!(metadata.handle, handle, "metadata handle mismatch");
        if handle.is_null() || metadata.handle != handle {
            log::error!("Rejected registry entry {} for metadata {}", handle, metadata.handle);
            return;
        }
        self.entries.insert(handle, metadata);
    }

    /// Mutate an entry in place
    pub fn update<R>(&mut self, handle: AssetHandle, f: impl FnOnce(&mut AssetMetadata) -> R) -> Option<R> {
        self.entries.get_mut(&handle).map(f)
    }

    pub fn contains(&self, handle: AssetHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn remove(&mut self, handle: AssetHandle) -> Option<AssetMetadata> {
        self.entries.remove(&handle)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetHandle, &AssetMetadata)> {
        self.entries.iter()
    }

    /// Find the entry with the given relative path
    pub fn find_by_path(&self, path: &Path) -> Option<AssetHandle> {
        self.entries
            .values()
            .find(|meta| meta.file_path == path)
            .map(|meta| meta.handle)
    }

    /// Read a registry file. Never fails: problems are logged and an empty
    /// (or partial) registry is returned.
    pub fn load_from_file(path: &Path) -> Self {
        let mut registry = Self::new();

        if !path.exists() {
            log::info!("No asset registry at {}, starting empty", path.display());
            return registry;
        }

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to read asset registry {}: {}", path.display(), e);
                return registry;
            }
        };

        if text.trim().is_empty() {
            log::info!("Asset registry {} is empty", path.display());
            return registry;
        }

        match parse_registry(&text) {
            Ok(entries) => {
                for metadata in entries {
                    if registry.contains(metadata.handle) {
                        log::warn!("Duplicate registry handle {}, keeping the last entry", metadata.handle);
                    }
                    registry.set(metadata.handle, metadata);
                }
                log::info!("Loaded {} asset registry entries from {}", registry.len(), path.display());
            }
            Err(e) => {
                log::error!("Failed to parse asset registry {}: {}", path.display(), e);
                log::warn!("Continuing with an empty asset registry");
            }
        }

        registry
    }

    /// Write every entry accepted by `keep`, sorted by handle. On failure an
    /// empty document is written in place of the broken one.
    pub fn save_to_file(&self, path: &Path, keep: impl Fn(&AssetMetadata) -> bool) -> AssetResult<usize> {
        let mut kept: Vec<&AssetMetadata> = self
            .entries
            .values()
            .filter(|meta| !meta.file_path.as_os_str().is_empty() && keep(meta))
            .collect();
        kept.sort_by_key(|meta| meta.handle);

        let result = serialize_registry(kept.iter().copied()).and_then(|text| {
            // Verify before overwriting the old file
            parse_registry(&text)?;
            write_file(path, text.as_bytes())
        });

        match result {
            Ok(()) => {
                log::debug!("Wrote {} asset registry entries to {}", kept.len(), path.display());
                Ok(kept.len())
            }
            Err(e) => {
                log::error!("Failed to write asset registry {}: {}", path.display(), e);
                if let Err(fallback) = write_file(path, EMPTY_DOCUMENT.as_bytes()) {
                    log::error!("Failed to write empty asset registry fallback: {}", fallback);
                }
                Err(e)
            }
        }
    }
}

const EMPTY_DOCUMENT: &str = "{\n  \"Assets\": []\n}";

#[derive(Serialize)]
struct RegistryDocumentOut<'a> {
    #[serde(rename = "Assets")]
    assets: Vec<RegistryEntryOut<'a>>,
}

#[derive(Serialize)]
struct RegistryEntryOut<'a> {
    #[serde(rename = "Handle")]
    handle: AssetHandle,
    #[serde(rename = "FilePath")]
    file_path: String,
    #[serde(rename = "Type")]
    asset_type: &'a str,
}

#[derive(Deserialize)]
struct RegistryDocumentIn {
    #[serde(rename = "Assets", default)]
    assets: Option<Box<RawValue>>,
}

#[derive(Deserialize)]
struct RegistryEntryIn {
    #[serde(rename = "Handle")]
    handle: Option<AssetHandle>,
    #[serde(rename = "FilePath")]
    file_path: Option<String>,
    #[serde(rename = "Type")]
    asset_type: Option<String>,
}

/// Serialize registry entries to the JSON document
pub fn serialize_registry<'a>(entries: impl IntoIterator<Item = &'a AssetMetadata>) -> AssetResult<String> {
    let assets = entries
        .into_iter()
        .map(|meta| RegistryEntryOut {
            handle: meta.handle,
            file_path: normalize_separators(&meta.file_path),
            asset_type: meta.asset_type.as_str(),
        })
        .collect();

    Ok(serde_json::to_string_pretty(&RegistryDocumentOut { assets })?)
}

/// Parse a registry document.
///
/// Top-level problems are errors. Individual bad entries are skipped with a
/// warning, including entries whose stored type disagrees with the type the
/// path's extension implies.
pub fn parse_registry(text: &str) -> AssetResult<Vec<AssetMetadata>> {
    let document: RegistryDocumentIn = serde_json::from_str(text)?;

    let Some(assets) = document.assets else {
        log::warn!("Asset registry has no 'Assets' array");
        return Ok(Vec::new());
    };

    let raw_entries: Vec<&RawValue> = serde_json::from_str(assets.get())
        .map_err(|e| AssetError::parse("asset registry", format!("'Assets' is not an array: {}", e)))?;

    let mut entries = Vec::with_capacity(raw_entries.len());
    for (index, raw) in raw_entries.into_iter().enumerate() {
        match parse_entry(raw) {
            Ok(metadata) => entries.push(metadata),
            Err(reason) => log::warn!("Skipping asset registry entry {}: {}", index, reason),
        }
    }

    Ok(entries)
}

fn parse_entry(raw: &RawValue) -> Result<AssetMetadata, String> {
    let entry: RegistryEntryIn = serde_json::from_str(raw.get()).map_err(|e| e.to_string())?;

    let handle = entry.handle.ok_or("missing Handle")?;
    let file_path = entry.file_path.ok_or("missing FilePath")?;
    let type_name = entry.asset_type.ok_or("missing Type")?;

    if handle.is_null() {
        return Err("null handle".into());
    }

    let asset_type = AssetType::from_name(&type_name);
    if asset_type == AssetType::None {
        return Err(format!("unknown type '{}' for {}", type_name, file_path));
    }

    let file_path = PathBuf::from(file_path.replace('\\', "/"));
    let inferred = AssetType::from_path(&file_path);
    if inferred != asset_type {
        return Err(format!(
            "type mismatch for {}: registry says {}, extension says {}",
            file_path.display(),
            asset_type,
            inferred
        ));
    }

    Ok(AssetMetadata::new(handle, asset_type, file_path))
}

/// Path as a forward-slash string
pub(crate) fn normalize_separators(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn write_file(path: &Path, bytes: &[u8]) -> AssetResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
        }
    }
    std::fs::write(path, bytes).map_err(|e| AssetError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::AssetStatus;

    fn entry(path: &str, ty: AssetType) -> AssetMetadata {
        AssetMetadata::new(AssetHandle::generate(), ty, path)
    }

    #[test]
    fn test_set_get_remove() {
        let mut registry = AssetRegistry::new();
        let meta = entry("textures/a.png", AssetType::Texture);
        registry.set(meta.handle, meta.clone());

        assert!(registry.contains(meta.handle));
        assert_eq!(registry.get(meta.handle), Some(meta.clone()));
        assert_eq!(registry.find_by_path(Path::new("textures/a.png")), Some(meta.handle));

        assert!(registry.remove(meta.handle).is_some());
        assert!(!registry.contains(meta.handle));
        assert_eq!(registry.get(meta.handle), None);
    }

    #[test]
    fn test_round_trip_ignores_transient_fields() {
        let mut originals = vec![
            entry("textures/a.png", AssetType::Texture),
            entry("meshes/crate.gltf", AssetType::MeshSource),
            entry("meshes/crate.vsmesh", AssetType::StaticMesh),
            entry("fonts/mono.ttf", AssetType::Font),
        ];
        originals[0].status = AssetStatus::Ready;
        originals[0].is_data_loaded = true;
        originals[0].file_last_write_time = 99;

        let text = serialize_registry(originals.iter()).unwrap();
        let parsed = parse_registry(&text).unwrap();

        assert_eq!(parsed.len(), originals.len());
        for (original, parsed) in originals.iter().zip(parsed.iter()) {
            assert_eq!(parsed.handle, original.handle);
            assert_eq!(parsed.file_path, original.file_path);
            assert_eq!(parsed.asset_type, original.asset_type);
            assert_eq!(parsed.status, AssetStatus::None);
            assert!(!parsed.is_data_loaded);
            assert_eq!(parsed.file_last_write_time, 0);
        }
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let text = r#"{"Assets": [
            {"Handle": 11, "FilePath": "meshes/tree.gltf", "Type": "Texture"},
            {"Handle": 12, "FilePath": "meshes/tree.gltf", "Type": "MeshSource"}
        ]}"#;
        let parsed = parse_registry(text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].handle, AssetHandle::from_u64(12));
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let text = r#"{"Assets": [
            {"Handle": "oops", "FilePath": "a.png", "Type": "Texture"},
            {"FilePath": "b.png", "Type": "Texture"},
            {"Handle": 0, "FilePath": "c.png", "Type": "Texture"},
            {"Handle": 3, "FilePath": "d.png", "Type": "Sound"},
            {"Handle": 4, "FilePath": "textures\\e.png", "Type": "Texture"}
        ]}"#;
        let parsed = parse_registry(text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].file_path, PathBuf::from("textures/e.png"));
    }

    #[test]
    fn test_large_handles_survive() {
        let meta = AssetMetadata::new(AssetHandle::from_u128(u128::MAX - 5), AssetType::Font, "f.otf");
        let text = serialize_registry([&meta]).unwrap();
        let parsed = parse_registry(&text).unwrap();
        assert_eq!(parsed[0].handle, meta.handle);
    }

    #[test]
    fn test_top_level_errors() {
        assert!(parse_registry("not json").is_err());
        assert!(parse_registry(r#"{"Assets": 5}"#).is_err());
        assert!(parse_registry(r#"{"Other": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_file_round_trip_drops_filtered_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asset_registry.json");

        let mut registry = AssetRegistry::new();
        let kept = entry("a.png", AssetType::Texture);
        let dropped = entry("gone.png", AssetType::Texture);
        let empty = entry("", AssetType::Texture);
        for meta in [&kept, &dropped, &empty] {
            registry.set(meta.handle, meta.clone());
        }

        let written = registry
            .save_to_file(&path, |meta| meta.file_path != Path::new("gone.png"))
            .unwrap();
        assert_eq!(written, 1);

        let loaded = AssetRegistry::load_from_file(&path);
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains(kept.handle));
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asset_registry.json");
        std::fs::write(&path, "{ \"Assets\": [ {").unwrap();

        assert!(AssetRegistry::load_from_file(&path).is_empty());
        assert!(AssetRegistry::load_from_file(&dir.path().join("missing.json")).is_empty());
    }
}
