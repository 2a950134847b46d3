//! Asset formats driven through the editor asset manager

use std::io::Cursor;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use void_asset::prelude::*;
use void_asset_formats::loaders::{TextureLoader, Vertex};
use void_asset_formats::*;

const TRIANGLE_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "buffers": [{
        "byteLength": 42,
        "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIA"
    }],
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
    ],
    "accessors": [
        { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
          "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
        { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
    ],
    "materials": [{ "name": "Red", "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] } }],
    "meshes": [{
        "name": "Triangle",
        "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }]
    }]
}"#;

const CUBE_FACE_OBJ: &str = "\
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
f 1 2 3 4
";

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        Self { dir }
    }

    fn manager(&self, async_assets: bool) -> EditorAssetManager {
        let config = AssetManagerConfig {
            async_assets,
            monitor_interval_ms: 10,
            hot_reload: false,
            ..AssetManagerConfig::for_project(self.dir.path())
        };
        let manager = EditorAssetManager::new(config, create_importer()).unwrap();
        register_placeholders(&manager);
        manager
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join("assets").join(relative)
    }

    fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn write_png(&self, relative: &str, size: u32, pixel: [u8; 4]) -> PathBuf {
        let img = image::RgbaImage::from_pixel(size, size, image::Rgba(pixel));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        self.write(relative, bytes)
    }
}

#[test]
fn test_texture_async_placeholder_resolves() {
    let project = Project::new();
    let path = project.write_png("textures/grass.png", 4, [0, 200, 0, 255]);
    let manager = project.manager(true);
    let handle = manager.import_asset(&path);

    let pending = manager.get_asset_async(handle);
    assert!(!pending.is_ready);
    let placeholder = downcast_asset::<Texture2D>(pending.asset.unwrap()).unwrap();
    assert_eq!((placeholder.width(), placeholder.height()), (1, 1));
    assert_eq!(placeholder.pixels(), &[255, 255, 255, 255]);

    let deadline = Instant::now() + Duration::from_secs(5);
    while !manager.is_asset_loaded(handle) && Instant::now() < deadline {
        manager.sync_with_asset_thread();
        thread::sleep(Duration::from_millis(5));
    }

    let texture = manager.get_asset_as::<Texture2D>(handle).unwrap();
    assert_eq!((texture.width(), texture.height()), (4, 4));
    assert_eq!(&texture.pixels()[..4], &[0, 200, 0, 255]);
    assert!(manager.get_asset_async(handle).is_ready);
}

#[test]
fn test_corrupt_texture_fails() {
    let project = Project::new();
    let path = project.write("textures/broken.png", b"not a png");
    let manager = project.manager(false);
    let handle = manager.import_asset(&path);

    assert!(manager.get_asset(handle).is_none());
    assert_eq!(manager.get_metadata(handle).status, AssetStatus::Invalid);
}

#[test]
fn test_texture_save_through_manager() {
    let project = Project::new();
    let manager = project.manager(false);
    let texture = Texture2D::new(
        AssetHandle::NULL,
        TextureLoader::checkerboard(4, 1, [0, 0, 0, 255], [255, 255, 255, 255]),
    );

    let saved = manager.create_or_replace_asset(project.path("textures/checker.png"), texture);
    let decoded = image::open(project.path("textures/checker.png")).unwrap().to_rgba8();
    assert_eq!(decoded.as_raw().as_slice(), saved.pixels());
}

#[test]
fn test_obj_mesh_source() {
    let project = Project::new();
    let path = project.write("meshes/quad.obj", CUBE_FACE_OBJ);
    let manager = project.manager(false);
    let handle = manager.import_asset(&path);
    assert_eq!(manager.get_asset_type(handle), AssetType::MeshSource);

    let mesh = manager.get_asset_as::<MeshSource>(handle).unwrap();
    assert_eq!(mesh.submeshes().len(), 1);
    assert_eq!(mesh.indices().len(), 6);
    assert_eq!(mesh.bounds().size(), [2.0, 2.0, 0.0]);
    assert_eq!(mesh.vertex_bytes().len(), mesh.vertices().len() * std::mem::size_of::<Vertex>());
    assert_eq!(mesh.index_bytes().len(), 6 * 4);
    assert!(mesh.materials().is_empty());
}


#[test]
fn test_gltf_materials_become_memory_assets() {
    let project = Project::new();
    let path = project.write("meshes/triangle.gltf", TRIANGLE_GLTF);
    let manager = project.manager(false);
    let handle = manager.import_asset(&path);

    let mesh = manager.get_asset_as::<MeshSource>(handle).unwrap();
    assert_eq!(mesh.vertices().len(), 3);
    assert_eq!(mesh.materials().len(), 1);

    let material_handle = mesh.materials()[0];
    assert!(manager.is_memory_asset(material_handle));
    let material = manager.get_asset_as::<MaterialAsset>(material_handle).unwrap();
    assert_eq!(material.data().albedo_color, [1.0, 0.0, 0.0]);
    assert!(manager.get_all_assets_with_type(AssetType::Material).contains(&material_handle));
}

#[test]
fn test_gltf_reload_replaces_materials() {
    let project = Project::new();
    let two_materials = TRIANGLE_GLTF.replace(r#""materials": ["#, r#""materials": [{ "name": "Blue" }, "#);
    let path = project.write("meshes/triangle.gltf", &two_materials);
    let manager = project.manager(false);
    let handle = manager.import_asset(&path);

    let first = manager.get_asset_as::<MeshSource>(handle).unwrap().materials().to_vec();
    assert_eq!(first.len(), 2);
    for _ in 0..5 {
        assert!(manager.reload_data(handle));
    }
    let reloaded = manager.get_asset_as::<MeshSource>(handle).unwrap().materials().to_vec();
    assert_eq!(reloaded, first);
    assert_eq!(manager.get_all_assets_with_type(AssetType::Material).len(), 2);

    project.write("meshes/triangle.gltf", TRIANGLE_GLTF);
    assert!(manager.reload_data(handle));
    let shrunk = manager.get_asset_as::<MeshSource>(handle).unwrap().materials().to_vec();
    assert_eq!(shrunk, vec![first[0]]);
    assert!(!manager.is_memory_asset(first[1]));
    assert_eq!(manager.get_all_assets_with_type(AssetType::Material).len(), 1);
    assert_eq!(manager.get_memory_only_assets().len(), 3);
}

#[test]
fn test_fbx_is_unsupported() {
    let project = Project::new();
    let path = project.write("meshes/rig.fbx", b"Kaydara FBX Binary");
    let manager = project.manager(false);
    let handle = manager.import_asset(&path);

    assert_eq!(manager.get_asset_type(handle), AssetType::MeshSource);
    assert!(manager.get_asset(handle).is_none());
    assert_eq!(manager.get_metadata(handle).status, AssetStatus::Invalid);
}

#[test]
fn test_static_mesh_with_missing_source_loads() {
    let project = Project::new();
    let dangling = AssetHandle::generate();
    let path = project.write(
        "meshes/rock.vsmesh",
        format!(r#"{{"Mesh": {{"MeshSource": {}, "SubmeshIndices": [0]}}}}"#, dangling.as_u128()),
    );
    let manager = project.manager(false);
    let handle = manager.import_asset(&path);

    let mesh = manager.get_asset_as::<StaticMesh>(handle).unwrap();
    assert_eq!(mesh.mesh_source(), dangling);
    assert_eq!(mesh.submesh_indices(), &[0]);
    assert!(manager.get_asset(dangling).is_none());
    assert!(manager.get_dependencies(handle).contains(&dangling));
    assert!(manager.get_dependents(dangling).contains(&handle));
}

#[test]
fn test_static_mesh_without_source() {
    let project = Project::new();
    let path = project.write("meshes/empty.vsmesh", r#"{"Mesh": {}}"#);
    let manager = project.manager(false);
    let handle = manager.import_asset(&path);

    let mesh = manager.get_asset_as::<StaticMesh>(handle).unwrap();
    assert!(mesh.mesh_source().is_null());
    assert!(manager.get_dependencies(handle).is_empty());
    assert!(manager.dependency_graph_consistent());
}

#[test]
fn test_static_mesh_dependencies_follow_edits() {
    let project = Project::new();
    let obj = project.write("meshes/quad.obj", CUBE_FACE_OBJ);
    let manager = project.manager(false);
    let source = manager.import_asset(&obj);

    let descriptor = |handle: AssetHandle| format!(r#"{{"Mesh": {{"MeshSource": {}}}}}"#, handle.as_u128());
    let path = project.write("meshes/quad.vsmesh", descriptor(source));
    let handle = manager.import_asset(&path);
    manager.get_asset(handle).unwrap();
    assert!(manager.get_dependents(source).contains(&handle));

    let other = AssetHandle::generate();
    std::fs::write(&path, descriptor(other)).unwrap();
    assert!(manager.reload_data(handle));

    assert!(!manager.get_dependents(source).contains(&handle));
    assert!(manager.get_dependents(other).contains(&handle));
    assert_eq!(manager.get_dependencies(handle).len(), 1);
}

#[test]
fn test_material_notified_when_texture_reloads() {
    let project = Project::new();
    let texture_path = project.write_png("textures/albedo.png", 2, [255, 0, 0, 255]);
    let manager = project.manager(false);
    let texture = manager.import_asset(&texture_path);

    let material_path = project.write(
        "materials/brick.vmat",
        format!(r#"{{"Material": {{"AlbedoMap": {}, "Roughness": 0.8}}}}"#, texture.as_u128()),
    );
    let material_handle = manager.import_asset(&material_path);

    assert!(manager.get_dependencies(material_handle).contains(&texture));

    let material = manager.get_asset_as::<MaterialAsset>(material_handle).unwrap();
    assert_eq!(material.data().roughness, 0.8);
    assert!(!material.needs_rebind());

    manager.get_asset(texture).unwrap();
    project.write_png("textures/albedo.png", 2, [0, 0, 255, 255]);
    assert!(manager.reload_data(texture));

    assert!(material.take_needs_rebind());
    assert_eq!(material.updated_dependencies(), vec![texture]);
}

#[test]
fn test_material_round_trip_through_disk() {
    let project = Project::new();
    let texture = AssetHandle::generate();
    let data = MaterialData {
        albedo_color: [0.1, 0.2, 0.3],
        metalness: 1.0,
        normal_map: texture,
        ..MaterialData::default()
    };

    let handle = {
        let manager = project.manager(false);
        let material = manager.create_or_replace_asset(
            project.path("materials/metal.vmat"),
            MaterialAsset::new(AssetHandle::NULL, data.clone()),
        );
        material.handle()
    };

    let manager = project.manager(false);
    let reloaded = manager.get_asset_as::<MaterialAsset>(handle).unwrap();
    assert_eq!(reloaded.data(), &data);
    assert!(manager.get_dependencies(handle).contains(&texture));
}

#[test]
fn test_fonts() {
    let project = Project::new();
    let good = project.write("fonts/ui.otf", b"OTTO\x00\x0a\x00\x80");
    let bad = project.write("fonts/fake.ttf", b"<html></html>");
    let manager = project.manager(false);

    let good = manager.import_asset(&good);
    let font = manager.get_asset_as::<Font>(good).unwrap();
    assert_eq!(font.name(), "ui");

    let bad = manager.import_asset(&bad);
    assert!(manager.get_asset(bad).is_none());
    assert!(manager.get_asset_including_invalid(bad).is_some());
    assert!(!manager.is_asset_valid(bad));
}

#[test]
fn test_placeholders_are_memory_assets() {
    let project = Project::new();
    let manager = project.manager(true);

    let texture = manager.placeholder_asset(AssetType::Texture).unwrap();
    let font = manager.placeholder_asset(AssetType::Font).unwrap();
    assert!(manager.is_memory_asset(texture.handle()));
    assert!(manager.is_memory_asset(font.handle()));
    assert!(manager.placeholder_asset(AssetType::Scene).is_none());
}
