//! Scene graph and hierarchical scene organization.
//!
//! A [`Scene`] owns a tree of [`SceneNode`]s plus the flat mesh and material
//! lists the nodes refer to by index. Transforms are cgmath column-major
//! matrices acting on column vectors, so a node's world transform is always
//! `parent_world * local`.

use std::path::PathBuf;

use cgmath::SquareMatrix;

use crate::data_structures::model::{Material, Mesh};

/// Composes a node's local transform with the world transform of its parent.
///
/// This is the only place where transform order is decided. The loaders and
/// the renderer both go through it.
pub fn world_transform(
    parent_world: &cgmath::Matrix4<f32>,
    local: &cgmath::Matrix4<f32>,
) -> cgmath::Matrix4<f32> {
    parent_world * local
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub local_transform: cgmath::Matrix4<f32>,
    /// Indices into [`Scene::meshes`], drawn in this order.
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            local_transform: cgmath::Matrix4::identity(),
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, local_transform: cgmath::Matrix4<f32>) -> Self {
        self.local_transform = local_transform;
        self
    }

    pub fn with_meshes(mut self, meshes: Vec<usize>) -> Self {
        self.meshes = meshes;
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(SceneNode::node_count)
            .sum::<usize>()
    }

    /// World transforms of every node in depth-first pre-order.
    pub fn world_transforms(
        &self,
        parent_world: cgmath::Matrix4<f32>,
    ) -> Vec<(&str, cgmath::Matrix4<f32>)> {
        let world = world_transform(&parent_world, &self.local_transform);
        let mut out = vec![(self.name.as_str(), world)];
        for child in &self.children {
            out.extend(child.world_transforms(world));
        }
        out
    }
}

/// Aggregate counts reported once after loading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub meshes: usize,
    pub faces: usize,
    pub materials: usize,
    pub nodes: usize,
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub root: SceneNode,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    /// Directory all material textures resolve under.
    pub base_dir: PathBuf,
}

impl Scene {
    pub fn new(
        root: SceneNode,
        meshes: Vec<Mesh>,
        materials: Vec<Material>,
        base_dir: PathBuf,
    ) -> Self {
        Self {
            root,
            meshes,
            materials,
            base_dir,
        }
    }

    pub fn material_of(&self, mesh: &Mesh) -> Option<&Material> {
        self.materials.get(mesh.material)
    }

    pub fn stats(&self) -> SceneStats {
        SceneStats {
            meshes: self.meshes.len(),
            faces: self.meshes.iter().map(|m| m.faces.len()).sum(),
            materials: self.materials.len(),
            nodes: self.root.node_count(),
        }
    }
}
