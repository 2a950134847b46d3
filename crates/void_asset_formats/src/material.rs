//! MaterialAsset - PBR parameters and texture maps (.vmat)
//!
//! File layout:
//!
//! ```json
//! { "Material": { "AlbedoColor": [1, 1, 1], "Metalness": 0, "Roughness": 0.5,
//!                 "Emission": 0, "Transparent": false,
//!                 "AlbedoMap": <handle>, "NormalMap": 0, "MetalnessMap": 0, "RoughnessMap": 0 } }
//! ```
//!
//! Texture maps are the material's dependencies; a zero handle means no map.

use crate::loaders::GltfMaterial;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use void_asset::prelude::*;

/// Serialized material parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MaterialData {
    pub albedo_color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub emission: f32,
    pub transparent: bool,
    pub albedo_map: AssetHandle,
    pub normal_map: AssetHandle,
    pub metalness_map: AssetHandle,
    pub roughness_map: AssetHandle,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            albedo_color: [1.0, 1.0, 1.0],
            metalness: 0.0,
            roughness: 0.5,
            emission: 0.0,
            transparent: false,
            albedo_map: AssetHandle::NULL,
            normal_map: AssetHandle::NULL,
            metalness_map: AssetHandle::NULL,
            roughness_map: AssetHandle::NULL,
        }
    }
}

impl MaterialData {
    /// Non-null texture maps, without duplicates
    pub fn texture_maps(&self) -> Vec<AssetHandle> {
        let mut maps = Vec::with_capacity(4);
        for map in [self.albedo_map, self.normal_map, self.metalness_map, self.roughness_map] {
            if map.is_valid() && !maps.contains(&map) {
                maps.push(map);
            }
        }
        maps
    }
}

impl From<&GltfMaterial> for MaterialData {
    fn from(material: &GltfMaterial) -> Self {
        let [r, g, b, _] = material.base_color;
        Self {
            albedo_color: [r, g, b],
            metalness: material.metallic,
            roughness: material.roughness,
            emission: material.emissive.iter().copied().fold(0.0, f32::max),
            transparent: material.transparent,
            ..Self::default()
        }
    }
}

#[derive(Serialize, Deserialize)]
struct MaterialDocument {
    #[serde(rename = "Material")]
    material: MaterialData,
}

/// Material asset
#[derive(Debug)]
pub struct MaterialAsset {
    base: AssetBase,
    data: MaterialData,
    needs_rebind: AtomicBool,
    updated: Mutex<Vec<AssetHandle>>,
}

impl MaterialAsset {
    pub fn new(handle: AssetHandle, data: MaterialData) -> Self {
        Self {
            base: AssetBase::new(handle),
            data,
            needs_rebind: AtomicBool::new(false),
            updated: Mutex::new(Vec::new()),
        }
    }

    pub fn data(&self) -> &MaterialData {
        &self.data
    }

    /// A texture map changed since the last [`take_needs_rebind`](Self::take_needs_rebind)
    pub fn needs_rebind(&self) -> bool {
        self.needs_rebind.load(Ordering::Acquire)
    }

    /// Clear and return the rebind flag
    pub fn take_needs_rebind(&self) -> bool {
        self.needs_rebind.swap(false, Ordering::AcqRel)
    }

    /// Every dependency update received, in order
    pub fn updated_dependencies(&self) -> Vec<AssetHandle> {
        self.updated.lock().clone()
    }
}

impl Asset for MaterialAsset {
    fn base(&self) -> &AssetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AssetBase {
        &mut self.base
    }

    fn asset_type(&self) -> AssetType {
        AssetType::Material
    }

    fn on_dependency_updated(&self, dependency: AssetHandle) {
        self.updated.lock().push(dependency);
        self.needs_rebind.store(true, Ordering::Release);
    }
}

/// Reads and writes .vmat files
pub struct MaterialSerializer;

impl MaterialSerializer {
    fn read_document(ctx: &SerializerContext) -> AssetResult<MaterialDocument> {
        let text = ctx.read_string()?;
        serde_json::from_str(&text).map_err(|e| ctx.parse_error(e.to_string()))
    }
}

impl AssetSerializer for MaterialSerializer {
    fn serialize(&self, ctx: &SerializerContext, asset: &dyn Asset) -> AssetResult<()> {
        let material = asset
            .downcast_ref::<MaterialAsset>()
            .ok_or_else(|| ctx.parse_error("asset is not a MaterialAsset"))?;
        let document = MaterialDocument {
            material: material.data.clone(),
        };
        ctx.write_bytes(serde_json::to_string_pretty(&document)?.as_bytes())
    }

    fn try_load_data(&self, ctx: &SerializerContext) -> AssetResult<AssetRef> {
        let document = Self::read_document(ctx)?;
        ctx.set_dependencies(document.material.texture_maps());
        Ok(Arc::new(MaterialAsset::new(ctx.handle(), document.material)))
    }

    fn discover_dependencies(&self, ctx: &SerializerContext) -> AssetResult<Vec<AssetHandle>> {
        Ok(Self::read_document(ctx)?.material.texture_maps())
    }
}
