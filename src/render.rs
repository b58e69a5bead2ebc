//! Scene traversal and per-draw render state.
//!
//! [`SceneRenderer`] walks a [`Scene`] depth-first and turns every mesh it
//! finds into a [`DrawCall`]: world transform, camera view, the fixed
//! projection, the material colour and the light of the active shading mode.
//! The graphics context is passed into every call as a [`GraphicsDevice`]
//! instead of being ambient state. The wgpu implementation lives in
//! [`crate::context::Context`], and tests substitute a recording device.
//!
//! # Key types
//!
//! - [`GraphicsDevice`] is the seam to the GPU (uploads, draws, frame boundaries)
//! - [`DrawUniforms`] is the exact uniform block the vertex shader reads
//! - [`SceneRenderer`] owns the geometry and texture caches for one scene

use cgmath::SquareMatrix;
use image::RgbaImage;

use crate::{
    camera::Projection,
    data_structures::{
        model::ModelVertex,
        scene_graph::{Scene, SceneNode, world_transform},
    },
    error::Result,
    pipelines::light::{Lighting, LightUniform},
    resources::{mesh::GeometryUploader, texture::TextureCache},
};

/// Handle to an uploaded vertex + index buffer pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryId(pub usize);

/// Handle to an uploaded, mipmapped texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/**
 * The uniform block bound for every draw. Field order and sizes match
 * `DrawUniforms` in the WGSL shaders: three column-major 4x4 matrices followed
 * by two vec4s, 224 bytes in total.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub light: LightUniform,
}

/// One indexed triangle draw over the full index buffer of `geometry`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub geometry: GeometryId,
    /// `None` draws with the device's white fallback texture.
    pub texture: Option<TextureId>,
    pub uniforms: DrawUniforms,
    pub index_count: u32,
}

pub trait GraphicsDevice {
    /// Starts a frame that will be cleared to `clear_colour`.
    fn begin_frame(&mut self, clear_colour: wgpu::Color);

    fn create_geometry(
        &mut self,
        label: &str,
        vertices: &[ModelVertex],
        indices: &[u32],
    ) -> Result<GeometryId>;

    /// `levels` is a full mip chain, level 0 first.
    fn create_texture(&mut self, label: &str, levels: &[RgbaImage]) -> Result<TextureId>;

    fn draw_indexed(&mut self, draw: DrawCall);

    /// Submits every draw since [`GraphicsDevice::begin_frame`] and presents.
    fn end_frame(&mut self) -> Result<()>;
}

/// Counters for a single traversal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes_visited: usize,
    pub draws: usize,
    /// Meshes that were not drawn (invalid, empty or failed to upload).
    pub skipped: usize,
}

/// Per-frame constants shared by every draw of a traversal.
struct FrameState {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    light: LightUniform,
}

pub struct SceneRenderer {
    projection: cgmath::Matrix4<f32>,
    geometry: GeometryUploader,
    textures: TextureCache,
}

impl SceneRenderer {
    /// The projection is fixed for the lifetime of the renderer.
    pub fn new(projection: &Projection) -> Self {
        Self {
            projection: projection.calc_matrix(),
            geometry: GeometryUploader::default(),
            textures: TextureCache::default(),
        }
    }

    pub fn projection(&self) -> cgmath::Matrix4<f32> {
        self.projection
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    pub fn geometry(&self) -> &GeometryUploader {
        &self.geometry
    }

    /// Clears with the shading mode's colour, draws `scene` and presents.
    pub fn render_frame<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        scene: &Scene,
        view: cgmath::Matrix4<f32>,
        lighting: &Lighting,
    ) -> Result<FrameStats> {
        device.begin_frame(lighting.clear_colour);
        let stats = self.render(device, scene, view, lighting.light);
        device.end_frame()?;
        log::trace!(
            "frame: {} nodes, {} draws, {} skipped",
            stats.nodes_visited,
            stats.draws,
            stats.skipped
        );
        Ok(stats)
    }

    /// Records draws for every mesh of every node reachable from the root.
    ///
    /// Traversal is depth-first pre-order. Children are visited in the order
    /// they were loaded, and the root's parent transform is the identity.
    pub fn render<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        scene: &Scene,
        view: cgmath::Matrix4<f32>,
        light: LightUniform,
    ) -> FrameStats {
        let frame = FrameState {
            view: view.into(),
            projection: self.projection.into(),
            light,
        };
        let mut stats = FrameStats::default();
        self.visit(
            device,
            scene,
            &scene.root,
            cgmath::Matrix4::identity(),
            &frame,
            &mut stats,
        );
        stats
    }

    fn visit<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        scene: &Scene,
        node: &SceneNode,
        parent_world: cgmath::Matrix4<f32>,
        frame: &FrameState,
        stats: &mut FrameStats,
    ) {
        stats.nodes_visited += 1;
        let world = world_transform(&parent_world, &node.local_transform);

        for &mesh_index in &node.meshes {
            if self.draw_mesh(device, scene, mesh_index, &world, frame) {
                stats.draws += 1;
            } else {
                stats.skipped += 1;
            }
        }

        for child in &node.children {
            self.visit(device, scene, child, world, frame, stats);
        }
    }

    fn draw_mesh<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        scene: &Scene,
        mesh_index: usize,
        world: &cgmath::Matrix4<f32>,
        frame: &FrameState,
    ) -> bool {
        let Some(mesh) = scene.meshes.get(mesh_index) else {
            log::warn!("A node references mesh {mesh_index}, but the scene only has {} meshes.", scene.meshes.len());
            return false;
        };
        let Some(uploaded) = self.geometry.get_or_upload(device, mesh_index, mesh) else {
            return false;
        };

        let material = scene.material_of(mesh);
        // A missing texture only costs the texture, the mesh is still drawn.
        let texture = material
            .and_then(|m| m.texture.as_deref())
            .and_then(|path| self.textures.get(device, path).ok());

        let color = material.map_or([1.0; 4], |m| m.shader_colour());
        device.draw_indexed(DrawCall {
            geometry: uploaded.geometry,
            texture,
            uniforms: DrawUniforms {
                model: (*world).into(),
                view: frame.view,
                projection: frame.projection,
                color,
                light: frame.light,
            },
            index_count: uploaded.index_count,
        });
        true
    }
}
