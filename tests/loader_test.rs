use std::path::{Path, PathBuf};

use cgmath::{Matrix4, SquareMatrix, Transform};
use scene_viewer::{
    ViewerError,
    resources::{load_scene, resolve_texture_path},
};

use crate::common::test_utils::{assert_close, fixture_dir, translation};

mod common;

const QUAD_OBJ: &str = "\
mtllib office.mtl
o Bare
v 5 5 5
v 6 5 5
v 5 6 5
f 1 2 3
o Quad
usemtl wall
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 4/1/1 5/2/1 6/3/1 7/4/1
";

const OFFICE_MTL: &str = "\
newmtl wall
Kd 0.5 0.25 1.0
d 0.5
map_Kd ./textures/wall.png

newmtl leaky
Kd 1.0 1.0 1.0
map_Kd ../../secret.png
";

fn write_obj_fixture(name: &str, obj: &str, mtl: &str) -> PathBuf {
    let dir = fixture_dir(name);
    std::fs::write(dir.join("office.obj"), obj).unwrap();
    std::fs::write(dir.join("office.mtl"), mtl).unwrap();
    dir.join("office.obj")
}

#[test]
fn should_load_obj_with_materials() {
    let path = write_obj_fixture("loader_obj", QUAD_OBJ, OFFICE_MTL);
    let dir = path.parent().unwrap().to_path_buf();
    let scene = load_scene(&path).unwrap();

    assert_eq!(scene.base_dir, dir);
    assert_eq!(scene.root.name, "office");
    assert_eq!(scene.root.local_transform, Matrix4::identity());
    let children: Vec<_> = scene.root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(children, vec!["Bare", "Quad"]);
    assert_eq!(scene.root.children[0].meshes, vec![0]);
    assert_eq!(scene.root.children[1].meshes, vec![1]);

    let stats = scene.stats();
    assert_eq!(stats.meshes, 2);
    assert_eq!(stats.faces, 3);
    assert_eq!(stats.nodes, 3);
    // wall, leaky and the shared default
    assert_eq!(stats.materials, 3);

    let quad = &scene.meshes[1];
    assert_eq!(quad.vertices.len(), 4);
    assert!(quad.validate().is_ok());
    let wall = scene.material_of(quad).unwrap();
    assert_eq!(wall.name, "wall");
    assert_eq!(wall.diffuse, [0.5, 0.25, 1.0, 0.5]);
    assert_eq!(wall.shader_colour(), [0.5, 0.25, 1.0, 1.0]);
    assert_eq!(wall.texture, Some(dir.join("textures").join("wall.png")));

    // obj texture origin is bottom left, flipped on load
    let first = quad
        .vertices
        .iter()
        .find(|v| v.position == [-1.0, -1.0, 0.0])
        .unwrap();
    assert_eq!(first.tex_coords, [0.0, 1.0]);
    assert_eq!(first.normal, [0.0, 0.0, 1.0]);

    let bare = &scene.meshes[0];
    let default = scene.material_of(bare).unwrap();
    assert_eq!(default.diffuse, [1.0; 4]);
    assert_eq!(default.texture, None);
    assert_eq!(bare.vertices[0].tex_coords, [0.0, 1.0]);
}

#[test]
fn should_drop_textures_outside_the_scene_directory() {
    let path = write_obj_fixture("loader_obj_escape", QUAD_OBJ, OFFICE_MTL);
    let scene = load_scene(&path).unwrap();
    let leaky = scene
        .materials
        .iter()
        .find(|m| m.name == "leaky")
        .unwrap();
    assert_eq!(leaky.texture, None);
    assert_eq!(leaky.diffuse, [1.0; 4]);
}

#[test]
fn should_fail_on_materials_without_diffuse_colour() {
    let mtl = "newmtl wall\nNs 10\n";
    let path = write_obj_fixture("loader_obj_no_diffuse", QUAD_OBJ, mtl);
    assert!(matches!(
        load_scene(&path),
        Err(ViewerError::AssetLoad { .. })
    ));
}

#[test]
fn should_fail_on_missing_scene_file() {
    let dir = fixture_dir("loader_missing");
    assert!(matches!(
        load_scene(&dir.join("nothing.obj")),
        Err(ViewerError::AssetLoad { .. })
    ));
    assert!(matches!(
        load_scene(&dir.join("scene.fbx")),
        Err(ViewerError::AssetLoad { .. })
    ));
}

#[test]
fn should_resolve_relative_texture_paths() {
    let base = Path::new("models/hokage");
    assert_eq!(
        resolve_texture_path(base, "./tex/wall.png").unwrap(),
        base.join("tex").join("wall.png")
    );
    assert_eq!(
        resolve_texture_path(base, "tex\\wall.png").unwrap(),
        base.join("tex").join("wall.png")
    );
    assert_eq!(
        resolve_texture_path(base, "tex/../wall.png").unwrap(),
        base.join("wall.png")
    );
}

#[test]
fn should_reject_escaping_texture_paths() {
    let base = Path::new("models/hokage");
    for raw in ["../wall.png", "tex/../../wall.png", "/etc/passwd", "", "tex/.."] {
        assert!(
            matches!(
                resolve_texture_path(base, raw),
                Err(ViewerError::AssetLoad { .. })
            ),
            "{raw:?} should be rejected"
        );
    }
}

const HIERARCHY_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [ { "nodes": [0] } ],
  "nodes": [
    { "name": "parent", "translation": [1.0, 2.0, 3.0], "mesh": 0, "children": [1] },
    { "name": "child", "translation": [10.0, 0.0, 0.0], "mesh": 0 }
  ],
  "meshes": [
    { "name": "tri", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] }
  ],
  "materials": [
    { "name": "red", "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] } }
  ],
  "buffers": [ { "uri": "tri.bin", "byteLength": 44 } ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ]
}"#;

fn write_gltf_fixture(name: &str) -> PathBuf {
    let dir = fixture_dir(name);
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let indices: [u16; 3] = [0, 1, 2];
    let mut bin = Vec::new();
    for p in positions {
        bin.extend_from_slice(&p.to_le_bytes());
    }
    for i in indices {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    bin.resize(44, 0);
    std::fs::write(dir.join("tri.bin"), bin).unwrap();
    std::fs::write(dir.join("tri_scene.gltf"), HIERARCHY_GLTF).unwrap();
    dir.join("tri_scene.gltf")
}

#[test]
fn should_load_gltf_node_hierarchy() {
    let path = write_gltf_fixture("loader_gltf");
    let scene = load_scene(&path).unwrap();

    assert_eq!(scene.root.name, "tri_scene");
    let parent = &scene.root.children[0];
    assert_eq!(parent.name, "parent");
    assert_eq!(parent.local_transform, translation(1.0, 2.0, 3.0));
    let child = &parent.children[0];
    assert_eq!(child.name, "child");

    // Both nodes instance the same mesh.
    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(parent.meshes, vec![0]);
    assert_eq!(child.meshes, vec![0]);
    assert_eq!(scene.meshes[0].faces, vec![[0, 1, 2]]);

    let transforms = scene.root.world_transforms(Matrix4::identity());
    let (_, child_world) = transforms
        .iter()
        .find(|(name, _)| *name == "child")
        .copied()
        .unwrap();
    let origin = child_world.transform_point(cgmath::Point3::new(0.0, 0.0, 0.0));
    assert_close(origin.x, 11.0);
    assert_close(origin.y, 2.0);
    assert_close(origin.z, 3.0);

    let red = scene.material_of(&scene.meshes[0]).unwrap();
    assert_eq!(red.name, "red");
    assert_eq!(red.diffuse, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(scene.materials.len(), 2);
}
