#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::RgbaImage;
use scene_viewer::{
    data_structures::model::{Material, Mesh, ModelVertex},
    error::{Result, ViewerError},
    render::{DrawCall, GeometryId, GraphicsDevice, TextureId},
};

pub(crate) struct RecordedGeometry {
    pub label: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

pub(crate) struct RecordedTexture {
    pub label: String,
    /// Dimensions of every uploaded mip level, level 0 first.
    pub levels: Vec<(u32, u32)>,
}

pub(crate) struct RecordedFrame {
    pub clear_colour: wgpu::Color,
    pub draws: Vec<DrawCall>,
}

/// A [`GraphicsDevice`] that keeps every upload and draw in memory.
#[derive(Default)]
pub(crate) struct RecordingDevice {
    pub geometries: Vec<RecordedGeometry>,
    pub textures: Vec<RecordedTexture>,
    pub frames: Vec<RecordedFrame>,
    current: Option<RecordedFrame>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> &RecordedFrame {
        self.frames.last().expect("no frame was rendered")
    }

    /// Draws recorded since the last `begin_frame`, for tests that call
    /// `SceneRenderer::render` directly.
    pub fn pending_draws(&self) -> &[DrawCall] {
        self.current.as_ref().map_or(&[], |f| f.draws.as_slice())
    }
}

impl GraphicsDevice for RecordingDevice {
    fn begin_frame(&mut self, clear_colour: wgpu::Color) {
        self.current = Some(RecordedFrame {
            clear_colour,
            draws: Vec::new(),
        });
    }

    fn create_geometry(
        &mut self,
        label: &str,
        vertices: &[ModelVertex],
        indices: &[u32],
    ) -> Result<GeometryId> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(ViewerError::DeviceResource(format!("{label}: empty geometry")));
        }
        self.geometries.push(RecordedGeometry {
            label: label.to_string(),
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        });
        Ok(GeometryId(self.geometries.len() - 1))
    }

    fn create_texture(&mut self, label: &str, levels: &[RgbaImage]) -> Result<TextureId> {
        self.textures.push(RecordedTexture {
            label: label.to_string(),
            levels: levels.iter().map(|l| l.dimensions()).collect(),
        });
        Ok(TextureId(self.textures.len() - 1))
    }

    fn draw_indexed(&mut self, draw: DrawCall) {
        self.current
            .get_or_insert_with(|| RecordedFrame {
                clear_colour: wgpu::Color::TRANSPARENT,
                draws: Vec::new(),
            })
            .draws
            .push(draw);
    }

    fn end_frame(&mut self) -> Result<()> {
        if let Some(frame) = self.current.take() {
            self.frames.push(frame);
        }
        Ok(())
    }
}

/// A fresh, empty directory under cargo's per-target scratch space.
pub(crate) fn fixture_dir(name: &str) -> PathBuf {
    let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join(name);
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("failed to clear fixture dir");
    }
    std::fs::create_dir_all(&dir).expect("failed to create fixture dir");
    dir
}

pub(crate) fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create texture dir");
    }
    let image = RgbaImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([40, 80, 120, 0])
        }
    });
    image.save(path).expect("failed to write png fixture");
}

pub(crate) fn vertex(position: [f32; 3]) -> ModelVertex {
    ModelVertex {
        position,
        normal: [0.0, 0.0, 1.0],
        tex_coords: [0.0, 0.0],
    }
}

/// Axis aligned unit quad (-1..1) in the z = `z` plane, two triangles.
pub(crate) fn quad_mesh(name: &str, z: f32, material: usize) -> Mesh {
    Mesh {
        name: name.to_string(),
        vertices: vec![
            vertex([-1.0, -1.0, z]),
            vertex([1.0, -1.0, z]),
            vertex([1.0, 1.0, z]),
            vertex([-1.0, 1.0, z]),
        ],
        faces: vec![[0, 1, 2], [0, 2, 3]],
        material,
    }
}

/// A triangle whose last face points past the end of the vertex list.
pub(crate) fn broken_mesh(material: usize) -> Mesh {
    Mesh {
        name: "broken".to_string(),
        vertices: vec![vertex([0.0; 3]), vertex([1.0, 0.0, 0.0]), vertex([0.0, 1.0, 0.0])],
        faces: vec![[0, 1, 2], [0, 2, 7]],
        material,
    }
}

pub(crate) fn red_material() -> Material {
    Material::new("red", [1.0, 0.0, 0.0, 0.25], None)
}

pub(crate) fn translation(x: f32, y: f32, z: f32) -> cgmath::Matrix4<f32> {
    cgmath::Matrix4::from_translation(cgmath::Vector3::new(x, y, z))
}

pub(crate) fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}
