//! Mesh geometry and the OBJ importer
//!
//! All importers produce a single shared vertex/index buffer with one
//! [`Submesh`] per drawable range.

/// Standard vertex format for all meshes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    /// Surface normal (normalized)
    pub normal: [f32; 3],
    /// Tangent with handedness in w component
    pub tangent: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tangent: [1.0, 0.0, 0.0, 1.0],
            uv,
        }
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    /// Calculate bounds from vertices
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        if vertices.is_empty() {
            return Self::default();
        }

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];

        for v in vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Self { min, max }
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Bounds) -> Bounds {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// A drawable range of the shared buffers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Submesh {
    pub name: String,
    pub base_vertex: u32,
    pub vertex_count: u32,
    pub base_index: u32,
    pub index_count: u32,
    /// Index into the owning mesh source's material list
    pub material_index: u32,
    pub bounds: Bounds,
}

/// Imported geometry
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    /// Indices are relative to each submesh's `base_vertex`
    pub indices: Vec<u32>,
    pub submeshes: Vec<Submesh>,
    pub bounds: Bounds,
}

impl MeshData {
    /// Append a primitive as a new submesh
    pub fn push_submesh(&mut self, name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>, material_index: u32) {
        let bounds = Bounds::from_vertices(&vertices);
        let submesh = Submesh {
            name: name.into(),
            base_vertex: self.vertices.len() as u32,
            vertex_count: vertices.len() as u32,
            base_index: self.indices.len() as u32,
            index_count: indices.len() as u32,
            material_index,
            bounds,
        };

        self.bounds = if self.submeshes.is_empty() {
            bounds
        } else {
            self.bounds.union(&bounds)
        };
        self.vertices.extend(vertices);
        self.indices.extend(indices);
        self.submeshes.push(submesh);
    }
}

/// Loader for Wavefront OBJ files
pub struct ObjLoader;

impl ObjLoader {
    /// Parse OBJ text. Groups and material switches start a new submesh; faces are
    /// fan-triangulated.
    pub fn load(text: &str) -> Result<MeshData, String> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut uvs: Vec<[f32; 2]> = Vec::new();

        let mut mesh = MeshData::default();
        let mut material_names: Vec<String> = Vec::new();
        let mut current = ObjGroup::default();

        for (line_number, line) in text.lines().enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            match parts[0] {
                "v" if parts.len() >= 4 => {
                    positions.push([
                        Self::parse_float(parts[1], line_number)?,
                        Self::parse_float(parts[2], line_number)?,
                        Self::parse_float(parts[3], line_number)?,
                    ]);
                }
                "vn" if parts.len() >= 4 => {
                    normals.push([
                        Self::parse_float(parts[1], line_number)?,
                        Self::parse_float(parts[2], line_number)?,
                        Self::parse_float(parts[3], line_number)?,
                    ]);
                }
                "vt" if parts.len() >= 2 => {
                    let v = match parts.get(2) {
                        Some(s) => Self::parse_float(s, line_number)?,
                        None => 0.0,
                    };
                    uvs.push([Self::parse_float(parts[1], line_number)?, 1.0 - v]);
                }
                "o" | "g" => {
                    current.flush(&mut mesh);
                    current.name = parts.get(1).copied().unwrap_or_default().to_string();
                }
                "usemtl" => {
                    let name = parts.get(1).copied().unwrap_or_default().to_string();
                    let material_index = match material_names.iter().position(|m| *m == name) {
                        Some(index) => index as u32,
                        None => {
                            material_names.push(name);
                            (material_names.len() - 1) as u32
                        }
                    };
                    if material_index != current.material_index {
                        current.flush(&mut mesh);
                        current.material_index = material_index;
                    }
                }
                "f" if parts.len() >= 4 => {
                    let face: Vec<Vertex> = parts[1..]
                        .iter()
                        .map(|p| Self::parse_vertex_index(p, &positions, &normals, &uvs))
                        .collect::<Option<_>>()
                        .ok_or_else(|| format!("Invalid face on line {}", line_number + 1))?;

                    for i in 1..face.len() - 1 {
                        let base = current.vertices.len() as u32;
                        current.vertices.extend([face[0], face[i], face[i + 1]]);
                        current.indices.extend([base, base + 1, base + 2]);
                    }
                }
                _ => {}
            }
        }
        current.flush(&mut mesh);

        if mesh.submeshes.is_empty() {
            return Err("OBJ file contains no faces".to_string());
        }

        if normals.is_empty() {
            Self::generate_flat_normals(&mut mesh);
        }

        Ok(mesh)
    }

    fn parse_float(s: &str, line_number: usize) -> Result<f32, String> {
        s.parse()
            .map_err(|_| format!("Invalid number '{}' on line {}", s, line_number + 1))
    }

    /// Parse a vertex reference like "1/2/3", "1//3" or "1". Negative
    /// indices count back from the end.
    fn parse_vertex_index(
        s: &str,
        positions: &[[f32; 3]],
        normals: &[[f32; 3]],
        uvs: &[[f32; 2]],
    ) -> Option<Vertex> {
        let parts: Vec<&str> = s.split('/').collect();

        let resolve = |raw: &str, len: usize| -> Option<usize> {
            let index: i64 = raw.parse().ok()?;
            if index > 0 {
                Some(index as usize - 1)
            } else if index < 0 {
                len.checked_sub(index.unsigned_abs() as usize)
            } else {
                None
            }
        };

        let position = *positions.get(resolve(parts.first()?, positions.len())?)?;

        let uv = match parts.get(1).filter(|s| !s.is_empty()) {
            Some(raw) => *uvs.get(resolve(raw, uvs.len())?)?,
            None => [0.0, 0.0],
        };

        let normal = match parts.get(2).filter(|s| !s.is_empty()) {
            Some(raw) => *normals.get(resolve(raw, normals.len())?)?,
            None => [0.0, 1.0, 0.0],
        };

        Some(Vertex::new(position, normal, uv))
    }

    /// Generate flat normals for a mesh without normals
    fn generate_flat_normals(mesh: &mut MeshData) {
        for submesh in &mesh.submeshes {
            let base = submesh.base_vertex as usize;
            let start = submesh.base_index as usize;
            let end = start + submesh.index_count as usize;

            for tri in mesh.indices[start..end].chunks_exact(3) {
                let [i0, i1, i2] = [
                    base + tri[0] as usize,
                    base + tri[1] as usize,
                    base + tri[2] as usize,
                ];
                let p0 = mesh.vertices[i0].position;
                let p1 = mesh.vertices[i1].position;
                let p2 = mesh.vertices[i2].position;

                let e1 = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
                let e2 = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];
                let n = [
                    e1[1] * e2[2] - e1[2] * e2[1],
                    e1[2] * e2[0] - e1[0] * e2[2],
                    e1[0] * e2[1] - e1[1] * e2[0],
                ];

                let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
                let normal = if len > 0.0001 {
                    [n[0] / len, n[1] / len, n[2] / len]
                } else {
                    [0.0, 1.0, 0.0]
                };

                for i in [i0, i1, i2] {
                    mesh.vertices[i].normal = normal;
                }
            }
        }
    }
}

/// Faces collected since the last group/material switch
#[derive(Default)]
struct ObjGroup {
    name: String,
    material_index: u32,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl ObjGroup {
    fn flush(&mut self, mesh: &mut MeshData) {
        if self.indices.is_empty() {
            return;
        }
        mesh.push_submesh(
            self.name.clone(),
            std::mem::take(&mut self.vertices),
            std::mem::take(&mut self.indices),
            self.material_index,
        );
    }
}
