use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use crate::{
    data_structures::{
        model::{Material, Mesh, ModelVertex},
        scene_graph::{Scene, SceneNode},
    },
    error::{Result, ViewerError},
    resources::{checked_texture_path, scene_base_dir, scene_name},
};

/// State shared while walking the node tree of one glTF document.
struct GltfImport<'a> {
    path: &'a Path,
    buffers: &'a [gltf::buffer::Data],
    default_material: usize,
    meshes: Vec<Mesh>,
    /// glTF mesh index -> indices of its primitives in `meshes`.
    mesh_cache: HashMap<usize, Vec<usize>>,
    visited: HashSet<usize>,
}

/// Loads a glTF 2.0 file (`.gltf` with external buffers, or binary `.glb`).
///
/// The node hierarchy of the default scene (or the first one) becomes the
/// children of the returned root. Every triangle primitive becomes its own
/// [`Mesh`]. Textures are only taken from external image files, embedded
/// images are reported and ignored.
pub fn load_gltf_scene(path: &Path) -> Result<Scene> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::open(path).map_err(|e| ViewerError::asset(path, e))?;
    let base_dir = scene_base_dir(path);
    let buffers = gltf::import_buffers(&document, Some(&base_dir), blob)
        .map_err(|e| ViewerError::asset(path, e))?;

    let mut materials = document
        .materials()
        .map(|m| material_from_gltf(&m, &base_dir))
        .collect::<Vec<_>>();
    let default_material = materials.len();
    materials.push(Material::default());

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| ViewerError::asset(path, "file contains no scene"))?;

    let mut import = GltfImport {
        path,
        buffers: &buffers,
        default_material,
        meshes: Vec::new(),
        mesh_cache: HashMap::new(),
        visited: HashSet::new(),
    };
    let mut root = SceneNode::new(&scene_name(path));
    for node in scene.nodes() {
        if let Some(child) = import.node(&node)? {
            root.add_child(child);
        }
    }

    let meshes = import.meshes;
    Ok(Scene::new(root, meshes, materials, base_dir))
}

fn material_from_gltf(material: &gltf::Material, base_dir: &Path) -> Material {
    let name = material
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("material{}", material.index().unwrap_or_default()));
    let pbr = material.pbr_metallic_roughness();
    let texture = pbr
        .base_color_texture()
        .and_then(|info| match info.texture().source().source() {
            gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                checked_texture_path(base_dir, uri, &name)
            }
            _ => {
                log::warn!("Material {name:?} uses an embedded image, which is not supported. Drawing untextured.");
                None
            }
        });
    Material::new(&name, pbr.base_color_factor(), texture)
}

impl GltfImport<'_> {
    fn node(&mut self, node: &gltf::Node) -> Result<Option<SceneNode>> {
        if !self.visited.insert(node.index()) {
            log::warn!(
                "Node {} of {:?} appears more than once in the hierarchy and is only drawn the first time.",
                node.index(),
                self.path
            );
            return Ok(None);
        }

        let name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", node.index()));
        let meshes = match node.mesh() {
            Some(mesh) => self.mesh(&mesh)?,
            None => Vec::new(),
        };
        let mut scene_node = SceneNode::new(&name)
            .with_transform(cgmath::Matrix4::from(node.transform().matrix()))
            .with_meshes(meshes);

        for child in node.children() {
            if let Some(child) = self.node(&child)? {
                scene_node.add_child(child);
            }
        }
        Ok(Some(scene_node))
    }

    /// Converts every triangle primitive of `mesh` once, no matter how many
    /// nodes instance it.
    fn mesh(&mut self, mesh: &gltf::Mesh) -> Result<Vec<usize>> {
        if let Some(indices) = self.mesh_cache.get(&mesh.index()) {
            return Ok(indices.clone());
        }

        let mesh_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh{}", mesh.index()));
        let mut indices = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Primitive {} of mesh {mesh_name:?} is not a triangle list and is skipped.",
                    primitive.index()
                );
                continue;
            }
            let converted = self.primitive(&primitive, &mesh_name)?;
            self.meshes.push(converted);
            indices.push(self.meshes.len() - 1);
        }
        self.mesh_cache.insert(mesh.index(), indices.clone());
        Ok(indices)
    }

    fn primitive(&self, primitive: &gltf::Primitive, mesh_name: &str) -> Result<Mesh> {
        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| {
                ViewerError::asset(self.path, format!("mesh {mesh_name:?} has no positions"))
            })?
            .collect();
        let mut normals = reader.read_normals().into_iter().flatten();
        let mut tex_coords = reader
            .read_tex_coords(0)
            .map(|t| t.into_f32())
            .into_iter()
            .flatten();

        let vertices = positions
            .iter()
            .map(|&position| ModelVertex {
                position,
                normal: normals.next().unwrap_or([0.0; 3]),
                tex_coords: tex_coords.next().unwrap_or([0.0; 2]),
            })
            .collect::<Vec<_>>();

        let flat_indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..vertices.len() as u32).collect(),
        };
        let faces = flat_indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        let material = primitive
            .material()
            .index()
            .unwrap_or(self.default_material);

        Ok(Mesh {
            name: format!("{mesh_name}/{}", primitive.index()),
            vertices,
            faces,
            material,
        })
    }
}
