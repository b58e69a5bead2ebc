//! The wgpu backed graphics device.
//!
//! [`Context`] owns the surface, device, queue and every GPU resource the
//! viewer creates. It implements [`GraphicsDevice`]: draws are collected
//! between `begin_frame` and `end_frame`, their uniforms are written into one
//! dynamically offset uniform buffer, and a single render pass replays them.

use std::sync::Arc;

use image::RgbaImage;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    config::ShaderPaths,
    data_structures::{model::ModelVertex, texture::Texture},
    error::{Result, ViewerError},
    pipelines::basic::ViewerPipeline,
    render::{DrawCall, DrawUniforms, GeometryId, GraphicsDevice, TextureId},
};

#[derive(Debug)]
struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

#[derive(Debug)]
struct GpuTexture {
    #[allow(unused)]
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Per-draw uniforms of one frame, one 256-aligned slot per draw.
#[derive(Debug)]
struct UniformArena {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Number of draws the buffer has room for.
    capacity: usize,
    stride: wgpu::BufferAddress,
}

impl UniformArena {
    const INITIAL_CAPACITY: usize = 64;

    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as wgpu::BufferAddress;
        let size = std::mem::size_of::<DrawUniforms>() as wgpu::BufferAddress;
        let stride = size.div_ceil(alignment) * alignment;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Buffer"),
            size: stride * capacity as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size),
                }),
            }],
            label: Some("draw_uniforms_bind_group"),
        });
        Self {
            buffer,
            bind_group,
            capacity,
            stride,
        }
    }

    fn buffer_size_needs_change(&self, draws: usize) -> bool {
        draws > self.capacity
    }

    /// Packs `draws` at `stride` intervals, ready for a single buffer write.
    fn pack(&self, draws: &[DrawCall]) -> Vec<u8> {
        let mut bytes = vec![0u8; self.stride as usize * draws.len()];
        for (slot, draw) in bytes.chunks_exact_mut(self.stride as usize).zip(draws) {
            let uniforms = bytemuck::bytes_of(&draw.uniforms);
            slot[..uniforms.len()].copy_from_slice(uniforms);
        }
        bytes
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pipeline: ViewerPipeline,
    uniforms: UniformArena,
    geometries: Vec<GpuGeometry>,
    textures: Vec<GpuTexture>,
    white: GpuTexture,
    frame: Vec<DrawCall>,
    clear_colour: wgpu::Color,
    is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, shaders: &ShaderPaths) -> Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| ViewerError::DeviceResource(format!("surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ViewerError::DeviceResource(format!("adapter: {e}")))?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| ViewerError::DeviceResource(format!("device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&surface_caps.formats)
            .ok_or_else(|| ViewerError::DeviceResource("surface has no formats".to_string()))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let pipeline = ViewerPipeline::new(&device, &config, shaders)?;
        let uniforms =
            UniformArena::new(&device, &pipeline.uniform_layout, UniformArena::INITIAL_CAPACITY);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        let white = Texture::create_white(&device, &queue)?;
        let white = GpuTexture {
            bind_group: texture_bind_group(&device, &pipeline.texture_layout, &white, "white"),
            texture: white,
        };

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            pipeline,
            uniforms,
            geometries: Vec::new(),
            textures: Vec::new(),
            white,
            frame: Vec::new(),
            clear_colour: wgpu::Color::WHITE,
            is_surface_configured: true,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.is_surface_configured = true;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Texture::create_depth_texture(
                &self.device,
                [self.config.width, self.config.height],
                "depth_texture",
            );
        } else {
            self.is_surface_configured = false;
        }
    }

    fn texture_bind_group(&self, texture: Option<TextureId>) -> &wgpu::BindGroup {
        texture
            .and_then(|TextureId(index)| self.textures.get(index))
            .map_or(&self.white.bind_group, |t| &t.bind_group)
    }
}

/// Picks a linear surface format so shader output is written unconverted.
/// sRGB-only surfaces get their first format.
pub fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
    label: &str,
) -> wgpu::BindGroup {
    let sampler = texture
        .sampler
        .clone()
        .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(device));
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
        label: Some(&format!("{label} texture bind group")),
    })
}

impl GraphicsDevice for Context {
    fn begin_frame(&mut self, clear_colour: wgpu::Color) {
        self.frame.clear();
        self.clear_colour = clear_colour;
    }

    fn create_geometry(
        &mut self,
        label: &str,
        vertices: &[ModelVertex],
        indices: &[u32],
    ) -> Result<GeometryId> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(ViewerError::DeviceResource(format!(
                "{label}: cannot create empty geometry"
            )));
        }
        let max_buffer_size = self.device.limits().max_buffer_size;
        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(indices);
        if vertex_bytes.len() as u64 > max_buffer_size || index_bytes.len() as u64 > max_buffer_size
        {
            return Err(ViewerError::DeviceResource(format!(
                "{label}: geometry exceeds the device buffer limit of {max_buffer_size} bytes"
            )));
        }

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: vertex_bytes,
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: index_bytes,
                usage: wgpu::BufferUsages::INDEX,
            });
        self.geometries.push(GpuGeometry {
            vertex_buffer,
            index_buffer,
        });
        Ok(GeometryId(self.geometries.len() - 1))
    }

    fn create_texture(&mut self, label: &str, levels: &[RgbaImage]) -> Result<TextureId> {
        let texture = Texture::from_mip_chain(&self.device, &self.queue, levels, label)?;
        let bind_group =
            texture_bind_group(&self.device, &self.pipeline.texture_layout, &texture, label);
        self.textures.push(GpuTexture {
            texture,
            bind_group,
        });
        Ok(TextureId(self.textures.len() - 1))
    }

    fn draw_indexed(&mut self, draw: DrawCall) {
        if self.geometries.get(draw.geometry.0).is_none() {
            log::warn!("Draw references unknown geometry {:?}", draw.geometry);
            return;
        }
        self.frame.push(draw);
    }

    fn end_frame(&mut self) -> Result<()> {
        if !self.is_surface_configured {
            self.frame.clear();
            return Ok(());
        }

        if self.uniforms.buffer_size_needs_change(self.frame.len()) {
            let capacity = self.frame.len().next_power_of_two();
            log::debug!("growing draw uniform buffer to {capacity} draws");
            self.uniforms = UniformArena::new(&self.device, &self.pipeline.uniform_layout, capacity);
        }
        if !self.frame.is_empty() {
            self.queue
                .write_buffer(&self.uniforms.buffer, 0, &self.uniforms.pack(&self.frame));
        }

        let output = self.surface.get_current_texture().map_err(|e| {
            self.frame.clear();
            ViewerError::Surface(e)
        })?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline.render_pipeline);
            for (slot, draw) in self.frame.iter().enumerate() {
                let Some(geometry) = self.geometries.get(draw.geometry.0) else {
                    continue;
                };
                let offset = (slot as wgpu::BufferAddress * self.uniforms.stride) as u32;
                render_pass.set_bind_group(0, &self.uniforms.bind_group, &[offset]);
                render_pass.set_bind_group(1, self.texture_bind_group(draw.texture), &[]);
                render_pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                render_pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.frame.clear();
        Ok(())
    }
}
