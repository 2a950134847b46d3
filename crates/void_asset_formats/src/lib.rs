//! # Void Asset Formats
//!
//! Concrete asset types and serializers for the editor asset manager.
//!
//! | Type       | Extensions                       | Asset                |
//! |------------|----------------------------------|----------------------|
//! | Texture    | .png .jpg .jpeg .bmp .hdr        | [`Texture2D`]        |
//! | MeshSource | .gltf .glb .obj (.fbx rejected)  | [`MeshSource`]       |
//! | StaticMesh | .vsmesh                          | [`StaticMesh`]       |
//! | Material   | .vmat                            | [`MaterialAsset`]    |
//! | Font       | .ttf .ttc .otf                   | [`Font`]             |
//!
//! ## Example
//!
//! ```ignore
//! use void_asset::prelude::*;
//!
//! let importer = void_asset_formats::create_importer();
//! let manager = EditorAssetManager::new(AssetManagerConfig::for_project("my_game"), importer)?;
//! void_asset_formats::register_placeholders(&manager);
//! ```

pub mod font;
pub mod loaders;
pub mod material;
pub mod mesh_source;
pub mod static_mesh;
pub mod texture;

pub use font::{Font, FontSerializer};
pub use material::{MaterialAsset, MaterialData, MaterialSerializer};
pub use mesh_source::{MeshSource, MeshSourceSerializer};
pub use static_mesh::{StaticMesh, StaticMeshSerializer};
pub use texture::{Texture2D, TextureSerializer};

use std::sync::Arc;
use void_asset::{AssetImporter, AssetSerializer, AssetType, EditorAssetManager};

/// Install every serializer in this crate
pub fn init_importer(importer: &AssetImporter) {
    let serializers: [(AssetType, Arc<dyn AssetSerializer>); 5] = [
        (AssetType::Texture, Arc::new(TextureSerializer)),
        (AssetType::MeshSource, Arc::new(MeshSourceSerializer)),
        (AssetType::StaticMesh, Arc::new(StaticMeshSerializer)),
        (AssetType::Material, Arc::new(MaterialSerializer)),
        (AssetType::Font, Arc::new(FontSerializer)),
    ];
    importer.init(serializers);
}

/// Importer with every serializer in this crate
pub fn create_importer() -> Arc<AssetImporter> {
    let importer = AssetImporter::new();
    init_importer(&importer);
    Arc::new(importer)
}

/// Register the white texture and the default font as memory-only assets
/// and use them as the async placeholders for their types
pub fn register_placeholders(manager: &EditorAssetManager) {
    let white = manager.add_memory_only_asset(Texture2D::white());
    if let Some(texture) = manager.memory_asset(white) {
        manager.register_placeholder(AssetType::Texture, move || Arc::clone(&texture));
    }

    let default_font = manager.add_memory_only_asset(Font::default_font());
    if let Some(font) = manager.memory_asset(default_font) {
        manager.register_placeholder(AssetType::Font, move || Arc::clone(&font));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importer_covers_file_types() {
        let importer = create_importer();
        for asset_type in [
            AssetType::Texture,
            AssetType::MeshSource,
            AssetType::StaticMesh,
            AssetType::Material,
            AssetType::Font,
        ] {
            assert!(importer.has_serializer(asset_type), "{}", asset_type);
        }
        assert!(!importer.has_serializer(AssetType::Scene));
    }
}
