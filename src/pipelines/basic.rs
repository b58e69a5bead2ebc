use std::path::Path;

use crate::{
    config::ShaderPaths,
    data_structures::{
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    error::{Result, ViewerError},
    render::DrawUniforms,
};

/// The single pipeline every mesh is drawn with, plus the layouts its bind
/// groups have to be created against.
#[derive(Debug)]
pub struct ViewerPipeline {
    pub render_pipeline: wgpu::RenderPipeline,
    /// Group 0: the per-draw [`DrawUniforms`], addressed by dynamic offset.
    pub uniform_layout: wgpu::BindGroupLayout,
    /// Group 1: diffuse texture and its sampler.
    pub texture_layout: wgpu::BindGroupLayout,
}

impl ViewerPipeline {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        shaders: &ShaderPaths,
    ) -> Result<Self> {
        let vertex = compile_shader(device, "vertex", &shaders.vertex)?;
        let fragment = compile_shader(device, "fragment", &shaders.fragment)?;

        let uniform_layout = uniform_bind_group_layout(device);
        let texture_layout = texture_bind_group_layout(device);
        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Viewer Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout, &texture_layout],
                push_constant_ranges: &[],
            });

        // Interface mismatches between the two stages surface here.
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let render_pipeline = mk_render_pipeline(
            device,
            &render_pipeline_layout,
            config.format,
            Some(wgpu::BlendState {
                alpha: wgpu::BlendComponent::REPLACE,
                color: wgpu::BlendComponent::REPLACE,
            }),
            Some(Texture::DEPTH_FORMAT),
            &[ModelVertex::desc()],
            &vertex,
            &fragment,
        );
        if let Some(error) = futures::executor::block_on(device.pop_error_scope()) {
            return Err(ViewerError::ShaderCompile {
                stage: "link",
                reason: error.to_string(),
            });
        }

        Ok(Self {
            render_pipeline,
            uniform_layout,
            texture_layout,
        })
    }
}

/// Reads and compiles one WGSL stage. Entry points are `vs_main` and `fs_main`.
pub fn compile_shader(
    device: &wgpu::Device,
    stage: &'static str,
    path: &Path,
) -> Result<wgpu::ShaderModule> {
    let source = std::fs::read_to_string(path).map_err(|e| ViewerError::ShaderCompile {
        stage,
        reason: format!("could not read {path:?}: {e}"),
    })?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{stage} shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match futures::executor::block_on(device.pop_error_scope()) {
        Some(error) => Err(ViewerError::ShaderCompile {
            stage,
            reason: error.to_string(),
        }),
        None => Ok(module),
    }
}

pub fn uniform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<DrawUniforms>() as wgpu::BufferAddress,
                ),
            },
            count: None,
        }],
        label: Some("draw_uniforms_bind_group_layout"),
    })
}

pub fn texture_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("diffuse_texture_bind_group_layout"),
    })
}

#[allow(clippy::too_many_arguments)]
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    vertex_shader: &wgpu::ShaderModule,
    fragment_shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Viewer Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex_shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment_shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Exported scenes mix winding orders.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
