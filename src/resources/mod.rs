use std::path::{Component, Path, PathBuf};

use crate::{
    data_structures::{
        model::Material,
        scene_graph::{Scene, SceneNode},
    },
    error::{Result, ViewerError},
};

/**
 * This module contains all logic for loading meshes, materials and textures from external files.
 */
pub mod gltf;
pub mod mesh;
pub mod texture;

/// Loads a scene file, picking the loader by file extension.
pub fn load_scene(path: &Path) -> Result<Scene> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let scene = match extension.as_deref() {
        Some("obj") => load_obj_scene(path)?,
        Some("gltf") | Some("glb") => gltf::load_gltf_scene(path)?,
        _ => {
            return Err(ViewerError::asset(
                path,
                "unsupported scene format, expected .obj, .gltf or .glb",
            ));
        }
    };

    let stats = scene.stats();
    log::info!("Loaded scene {:?}", path);
    log::info!("  meshes: {}", stats.meshes);
    log::info!("  faces: {}", stats.faces);
    log::info!("  materials: {}", stats.materials);
    log::info!("  nodes: {}", stats.nodes);
    Ok(scene)
}

/// Directory that textures of the scene at `path` resolve under.
pub fn scene_base_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn scene_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scene".to_string())
}

/// Loads a Wavefront obj file and its mtl library.
///
/// Obj files have no hierarchy: every object becomes one child of the root,
/// all with identity transforms. Meshes without a usable material share a
/// white default material appended after the file's own materials.
pub fn load_obj_scene(path: &Path) -> Result<Scene> {
    let (models, obj_materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| ViewerError::asset(path, e))?;

    let base_dir = scene_base_dir(path);
    let mut materials = match obj_materials {
        Ok(obj_materials) => obj_materials
            .iter()
            .map(|m| material_from_obj(m, &base_dir))
            .collect::<Result<Vec<_>>>()?,
        Err(e) => {
            log::warn!("The material library of {path:?} could not be loaded: {e}");
            Vec::new()
        }
    };
    let default_material = materials.len();
    materials.push(Material::default());

    let mut root = SceneNode::new(&scene_name(path));
    let mut meshes = Vec::with_capacity(models.len());
    for model in &models {
        let material = model
            .mesh
            .material_id
            .filter(|&id| id < default_material)
            .unwrap_or(default_material);
        root.add_child(SceneNode::new(&model.name).with_meshes(vec![meshes.len()]));
        meshes.push(mesh::mesh_from_obj(model, material));
    }

    Ok(Scene::new(root, meshes, materials, base_dir))
}

/// Builds a [`Material`] from an mtl entry. The diffuse colour (`Kd`) is
/// required, the alpha comes from the dissolve value (`d`).
pub fn material_from_obj(material: &tobj::Material, base_dir: &Path) -> Result<Material> {
    let [r, g, b] = material.diffuse.ok_or_else(|| {
        ViewerError::asset(
            base_dir,
            format!("material {:?} has no diffuse colour", material.name),
        )
    })?;
    let alpha = material.dissolve.unwrap_or(1.0);
    let texture = material
        .diffuse_texture
        .as_deref()
        .and_then(|raw| checked_texture_path(base_dir, raw, &material.name));
    Ok(Material::new(&material.name, [r, g, b, alpha], texture))
}

/// [`resolve_texture_path`], downgrading a rejected path to "untextured".
pub(crate) fn checked_texture_path(base_dir: &Path, raw: &str, material: &str) -> Option<PathBuf> {
    match resolve_texture_path(base_dir, raw) {
        Ok(path) => Some(path),
        Err(e) => {
            log::warn!("Material {material:?} is drawn untextured: {e}");
            None
        }
    }
}

/// Resolves a texture reference from a material file against the scene
/// directory. References are relative, may start with `./` and may use
/// backslashes. Absolute paths and paths that leave `base_dir` are rejected.
pub fn resolve_texture_path(base_dir: &Path, raw: &str) -> Result<PathBuf> {
    let normalised = raw.trim().replace('\\', "/");
    let relative = Path::new(normalised.trim_start_matches("./"));
    if normalised.is_empty() {
        return Err(ViewerError::asset(relative, "empty texture path"));
    }

    let mut resolved = base_dir.to_path_buf();
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(ViewerError::asset(
                        relative,
                        "texture path leaves the scene directory",
                    ));
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ViewerError::asset(
                    relative,
                    "absolute texture paths are not allowed",
                ));
            }
        }
    }
    if depth == 0 {
        return Err(ViewerError::asset(relative, "texture path names no file"));
    }
    Ok(resolved)
}

