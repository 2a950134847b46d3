//! MeshSource asset - geometry imported from .gltf, .glb and .obj files
//!
//! glTF materials become memory-only [`MaterialAsset`]s created during the
//! import; their handles are kept in submesh material order. Each slot's
//! handle is derived from the mesh handle, so a reload replaces the
//! previous import's materials instead of adding new ones.

use crate::loaders::{Bounds, GltfLoader, MeshData, ObjLoader, Submesh, Vertex};
use crate::material::{MaterialAsset, MaterialData};
use void_asset::prelude::*;

/// Imported mesh geometry
#[derive(Debug)]
pub struct MeshSource {
    base: AssetBase,
    mesh: MeshData,
    materials: Vec<AssetHandle>,
}

impl MeshSource {
    pub fn new(handle: AssetHandle, mesh: MeshData, materials: Vec<AssetHandle>) -> Self {
        Self {
            base: AssetBase::new(handle),
            mesh,
            materials,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.mesh.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.mesh.indices
    }

    pub fn submeshes(&self) -> &[Submesh] {
        &self.mesh.submeshes
    }

    pub fn bounds(&self) -> Bounds {
        self.mesh.bounds
    }

    /// Memory-only material per material slot
    pub fn materials(&self) -> &[AssetHandle] {
        &self.materials
    }

    /// Vertex buffer as raw bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.mesh.vertices)
    }

    /// Index buffer as raw bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.mesh.indices)
    }
}

impl Asset for MeshSource {
    fn base(&self) -> &AssetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AssetBase {
        &mut self.base
    }

    fn asset_type(&self) -> AssetType {
        AssetType::MeshSource
    }
}

/// Import-only serializer for mesh source files
pub struct MeshSourceSerializer;

impl AssetSerializer for MeshSourceSerializer {
    fn serialize(&self, _ctx: &SerializerContext, _asset: &dyn Asset) -> AssetResult<()> {
        Err(AssetError::UnsupportedFormat(
            "mesh sources are imported, not saved".to_string(),
        ))
    }

    fn try_load_data(&self, ctx: &SerializerContext) -> AssetResult<AssetRef> {
        let extension = ctx.extension().unwrap_or_default();

        let (mesh, materials) = match extension.as_str() {
            "obj" => {
                let text = ctx.read_string()?;
                let mesh = ObjLoader::load(&text).map_err(|e| ctx.parse_error(e))?;
                (mesh, Vec::new())
            }
            "gltf" | "glb" => {
                let bytes = ctx.read_bytes()?;
                let import = GltfLoader::load(&bytes, ctx.path().parent()).map_err(|e| ctx.parse_error(e))?;

                let materials = import
                    .materials
                    .iter()
                    .enumerate()
                    .map(|(slot, material)| {
                        let handle = ctx.sub_asset_handle(slot as u64);
                        ctx.add_memory_only_asset(MaterialAsset::new(handle, MaterialData::from(material)))
                    })
                    .collect::<Vec<_>>();
                (import.mesh, materials)
            }
            other => return Err(AssetError::UnsupportedFormat(format!(".{} meshes", other))),
        };

        // Slots the file no longer has
        let mut slot = materials.len() as u64;
        while ctx.remove_memory_only_asset(ctx.sub_asset_handle(slot)) {
            slot += 1;
        }

        log::debug!(
            "Imported {}: {} vertices, {} submeshes",
            ctx.path().display(),
            mesh.vertices.len(),
            mesh.submeshes.len()
        );
        Ok(Arc::new(MeshSource::new(ctx.handle(), mesh, materials)))
    }
}
