//! Asset types and the file-extension table

use core::fmt;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of asset stored behind a handle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetType {
    #[default]
    None,
    Scene,
    Mesh,
    StaticMesh,
    MeshSource,
    Material,
    Texture,
    Font,
}

/// Extension (lowercase, with dot) to asset type
const EXTENSION_TABLE: &[(&str, AssetType)] = &[
    (".vscene", AssetType::Scene),
    (".vmesh", AssetType::Mesh),
    (".vsmesh", AssetType::StaticMesh),
    (".gltf", AssetType::MeshSource),
    (".glb", AssetType::MeshSource),
    (".obj", AssetType::MeshSource),
    (".fbx", AssetType::MeshSource),
    (".vmat", AssetType::Material),
    (".png", AssetType::Texture),
    (".jpg", AssetType::Texture),
    (".jpeg", AssetType::Texture),
    (".bmp", AssetType::Texture),
    (".hdr", AssetType::Texture),
    (".ttf", AssetType::Font),
    (".ttc", AssetType::Font),
    (".otf", AssetType::Font),
];

impl AssetType {
    /// All concrete types
    pub const ALL: [AssetType; 7] = [
        AssetType::Scene,
        AssetType::Mesh,
        AssetType::StaticMesh,
        AssetType::MeshSource,
        AssetType::Material,
        AssetType::Texture,
        AssetType::Font,
    ];

    /// Name used in the registry file
    pub const fn as_str(&self) -> &'static str {
        match self {
            AssetType::None => "None",
            AssetType::Scene => "Scene",
            AssetType::Mesh => "Mesh",
            AssetType::StaticMesh => "StaticMesh",
            AssetType::MeshSource => "MeshSource",
            AssetType::Material => "Material",
            AssetType::Texture => "Texture",
            AssetType::Font => "Font",
        }
    }

    /// Parse a registry name, `None` for anything unknown
    pub fn from_name(name: &str) -> AssetType {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == name)
            .unwrap_or(AssetType::None)
    }

    /// Look up an extension, with or without the leading dot
    pub fn from_extension(extension: &str) -> AssetType {
        let lower = extension.to_ascii_lowercase();
        let key = if lower.starts_with('.') {
            lower
        } else {
            format!(".{}", lower)
        };

        EXTENSION_TABLE
            .iter()
            .find(|(ext, _)| *ext == key)
            .map(|(_, ty)| *ty)
            .unwrap_or(AssetType::None)
    }

    /// Infer the type from a file path
    pub fn from_path(path: impl AsRef<Path>) -> AssetType {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(AssetType::None)
    }

    /// First extension registered for the type
    pub fn default_extension(&self) -> Option<&'static str> {
        EXTENSION_TABLE
            .iter()
            .find(|(_, ty)| ty == self)
            .map(|(ext, _)| *ext)
    }

    /// All extensions registered for the type
    pub fn extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        EXTENSION_TABLE
            .iter()
            .filter(move |(_, ty)| ty == self)
            .map(|(ext, _)| *ext)
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for ty in AssetType::ALL {
            assert_eq!(AssetType::from_name(ty.as_str()), ty);
        }
        assert_eq!(AssetType::from_name("Sound"), AssetType::None);
    }

    #[test]
    fn test_extension_lookup() {
        assert_eq!(AssetType::from_extension(".png"), AssetType::Texture);
        assert_eq!(AssetType::from_extension("PNG"), AssetType::Texture);
        assert_eq!(AssetType::from_extension(".gltf"), AssetType::MeshSource);
        assert_eq!(AssetType::from_extension(".otf"), AssetType::Font);
        assert_eq!(AssetType::from_extension(".txt"), AssetType::None);
    }

    #[test]
    fn test_path_lookup() {
        assert_eq!(AssetType::from_path("meshes/crate.vsmesh"), AssetType::StaticMesh);
        assert_eq!(AssetType::from_path("materials/Brick.VMAT"), AssetType::Material);
        assert_eq!(AssetType::from_path("README"), AssetType::None);
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(AssetType::Material.default_extension(), Some(".vmat"));
        assert_eq!(AssetType::None.default_extension(), None);
        assert_eq!(AssetType::Font.extensions().count(), 3);
    }
}
