//! Format decoders for the files behind each asset type

pub mod gltf;
pub mod mesh;
mod texture;

pub use self::gltf::{GltfImport, GltfLoader, GltfMaterial};
pub use mesh::{Bounds, MeshData, ObjLoader, Submesh, Vertex};
pub use texture::{TextureData, TextureFormat, TextureLoader};
