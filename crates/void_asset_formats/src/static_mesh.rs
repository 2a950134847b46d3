//! StaticMesh asset (.vsmesh) - a selection of submeshes from a MeshSource

use serde::{Deserialize, Serialize};
use void_asset::prelude::*;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct StaticMeshData {
    mesh_source: AssetHandle,
    submesh_indices: Vec<u32>,
}

#[derive(Serialize, Deserialize)]
struct StaticMeshDocument {
    #[serde(rename = "Mesh")]
    mesh: StaticMeshData,
}

/// Renderable mesh referencing imported geometry
#[derive(Debug)]
pub struct StaticMesh {
    base: AssetBase,
    mesh_source: AssetHandle,
    submesh_indices: Vec<u32>,
}

impl StaticMesh {
    pub fn new(handle: AssetHandle, mesh_source: AssetHandle, submesh_indices: Vec<u32>) -> Self {
        Self {
            base: AssetBase::new(handle),
            mesh_source,
            submesh_indices,
        }
    }

    /// Null when the descriptor names no source
    pub fn mesh_source(&self) -> AssetHandle {
        self.mesh_source
    }

    /// Empty means every submesh
    pub fn submesh_indices(&self) -> &[u32] {
        &self.submesh_indices
    }
}

impl Asset for StaticMesh {
    fn base(&self) -> &AssetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AssetBase {
        &mut self.base
    }

    fn asset_type(&self) -> AssetType {
        AssetType::StaticMesh
    }
}

/// Reads and writes .vsmesh descriptors
pub struct StaticMeshSerializer;

impl StaticMeshSerializer {
    fn read_document(ctx: &SerializerContext) -> AssetResult<StaticMeshData> {
        let text = ctx.read_string()?;
        serde_json::from_str::<StaticMeshDocument>(&text)
            .map(|document| document.mesh)
            .map_err(|e| ctx.parse_error(e.to_string()))
    }

    fn dependencies(data: &StaticMeshData) -> Vec<AssetHandle> {
        if data.mesh_source.is_valid() {
            vec![data.mesh_source]
        } else {
            Vec::new()
        }
    }
}

impl AssetSerializer for StaticMeshSerializer {
    fn serialize(&self, ctx: &SerializerContext, asset: &dyn Asset) -> AssetResult<()> {
        let mesh = asset
            .downcast_ref::<StaticMesh>()
            .ok_or_else(|| ctx.parse_error("asset is not a StaticMesh"))?;
        let document = StaticMeshDocument {
            mesh: StaticMeshData {
                mesh_source: mesh.mesh_source,
                submesh_indices: mesh.submesh_indices.clone(),
            },
        };
        ctx.write_bytes(serde_json::to_string_pretty(&document)?.as_bytes())
    }

    /// A missing source still loads; the dependency set is rebuilt on every load
    fn try_load_data(&self, ctx: &SerializerContext) -> AssetResult<AssetRef> {
        let data = Self::read_document(ctx)?;
        if data.mesh_source.is_null() {
            log::warn!("{} has no mesh source", ctx.path().display());
        }

        ctx.set_dependencies(Self::dependencies(&data));
        Ok(Arc::new(StaticMesh::new(
            ctx.handle(),
            data.mesh_source,
            data.submesh_indices,
        )))
    }

    fn discover_dependencies(&self, ctx: &SerializerContext) -> AssetResult<Vec<AssetHandle>> {
        Ok(Self::dependencies(&Self::read_document(ctx)?))
    }
}
