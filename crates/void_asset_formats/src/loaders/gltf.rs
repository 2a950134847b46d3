//! glTF 2.0 importer (.gltf and .glb)

use super::mesh::{MeshData, Vertex};
use std::path::Path;

/// PBR parameters of an imported glTF material
#[derive(Clone, Debug, PartialEq)]
pub struct GltfMaterial {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub transparent: bool,
}

impl Default for GltfMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0, 0.0, 0.0],
            transparent: false,
        }
    }
}

/// Geometry and materials read from one glTF file
#[derive(Clone, Debug, Default)]
pub struct GltfImport {
    pub mesh: MeshData,
    pub materials: Vec<GltfMaterial>,
}

/// Loader for glTF/GLB files
pub struct GltfLoader;

impl GltfLoader {
    /// Import from file bytes. External buffers are resolved against
    /// `base_dir`.
    pub fn load(data: &[u8], base_dir: Option<&Path>) -> Result<GltfImport, String> {
        let gltf::Gltf { document, blob } =
            gltf::Gltf::from_slice(data).map_err(|e| format!("Failed to parse glTF: {}", e))?;
        let buffers = gltf::import_buffers(&document, base_dir, blob)
            .map_err(|e| format!("Failed to load glTF buffers: {}", e))?;

        Ok(GltfImport {
            mesh: Self::load_meshes(&document, &buffers)?,
            materials: Self::load_materials(&document),
        })
    }

    fn load_materials(document: &gltf::Document) -> Vec<GltfMaterial> {
        document
            .materials()
            .map(|mat| {
                let pbr = mat.pbr_metallic_roughness();
                GltfMaterial {
                    name: mat.name().unwrap_or("").to_string(),
                    base_color: pbr.base_color_factor(),
                    metallic: pbr.metallic_factor(),
                    roughness: pbr.roughness_factor(),
                    emissive: mat.emissive_factor(),
                    transparent: mat.alpha_mode() == gltf::material::AlphaMode::Blend,
                }
            })
            .collect()
    }

    fn load_meshes(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<MeshData, String> {
        let mut data = MeshData::default();

        for mesh in document.meshes() {
            let name = mesh.name().unwrap_or("");

            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!("Skipping non-triangle primitive in glTF mesh '{}'", name);
                    continue;
                }

                let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| b.0.as_slice()));

                let positions: Vec<[f32; 3]> = reader
                    .read_positions()
                    .ok_or_else(|| format!("Mesh '{}' missing positions", name))?
                    .collect();

                let normals: Vec<[f32; 3]> = reader
                    .read_normals()
                    .map(|n| n.collect())
                    .unwrap_or_default();

                let uvs: Vec<[f32; 2]> = reader
                    .read_tex_coords(0)
                    .map(|t| t.into_f32().collect())
                    .unwrap_or_default();

                let tangents: Vec<[f32; 4]> = reader
                    .read_tangents()
                    .map(|t| t.collect())
                    .unwrap_or_default();

                let indices: Vec<u32> = reader
                    .read_indices()
                    .map(|i| i.into_u32().collect())
                    .unwrap_or_else(|| (0..positions.len() as u32).collect());

                if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                    return Err(format!("Mesh '{}' index {} out of range", name, bad));
                }

                let vertices: Vec<Vertex> = positions
                    .iter()
                    .enumerate()
                    .map(|(i, &position)| Vertex {
                        position,
                        normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                        tangent: tangents.get(i).copied().unwrap_or([1.0, 0.0, 0.0, 1.0]),
                        uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                    })
                    .collect();

                let material_index = primitive.material().index().unwrap_or(0) as u32;
                data.push_submesh(name, vertices, indices, material_index);
            }
        }

        if data.submeshes.is_empty() {
            return Err("glTF file contains no triangle meshes".to_string());
        }
        Ok(data)
    }
}
