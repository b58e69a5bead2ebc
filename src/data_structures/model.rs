//! Mesh and material definitions as produced by the scene loader.
//!
//! Everything in here is plain CPU data. GPU copies are created lazily by the
//! renderer through [`crate::render::GraphicsDevice`].

use std::path::PathBuf;

use crate::error::{Result, ViewerError};

/// Describes how a vertex type is laid out in a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/**
 * The interleaved record stored in every vertex buffer: position, normal and
 * texture coordinate, 8 floats in total.
 */
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        },
    ];
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// A triangle mesh. `faces` index into `vertices`.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub faces: Vec<[u32; 3]>,
    /// Index into the owning scene's material list.
    pub material: usize,
}

impl Mesh {
    /// Rejects meshes whose faces reference vertices that do not exist.
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertices.len();
        match self
            .faces
            .iter()
            .flatten()
            .find(|&&index| index as usize >= vertex_count)
        {
            Some(&index) => Err(ViewerError::InvalidMesh {
                mesh: self.name.clone(),
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }

    /// Flattened triangle list as uploaded to the index buffer.
    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }

    pub fn index_count(&self) -> u32 {
        (self.faces.len() * 3) as u32
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    /// RGBA, each component in [0, 1].
    pub diffuse: [f32; 4],
    /// Resolved texture path, always located under the scene directory.
    pub texture: Option<PathBuf>,
}

impl Material {
    pub fn new(name: &str, diffuse: [f32; 4], texture: Option<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            diffuse: diffuse.map(|c| c.clamp(0.0, 1.0)),
            texture,
        }
    }

    /// Colour bound to the shader. Alpha is always forced to 1.
    pub fn shader_colour(&self) -> [f32; 4] {
        [self.diffuse[0], self.diffuse[1], self.diffuse[2], 1.0]
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", [1.0, 1.0, 1.0, 1.0], None)
    }
}
