//! The two pipelines draw calls go through, and the bind group layouts they share.
//!
//! # Architecture
//!
//! Both pipelines use two bind groups:
//! - **Group 0**: per-draw uniforms (model, view, projection, colour) in one
//!   buffer, selected with a dynamic offset
//! - **Group 1**: the sampled texture and its sampler, a 2D texture for the
//!   mesh pipeline and the cubemap for the skybox pipeline
//!
//! # Pipeline Configuration
//!
//! - Mesh: back-face culling (counter-clockwise front faces), alpha blending,
//!   depth write with Less-than comparison
//! - Skybox: the same culling, vertices pushed to the far plane, depth tested
//!   with Less-equal and never written, so it only fills what meshes left empty

use crate::gpu::GpuContext;
use crate::primitives::Vertex3d;
use crate::render::{DEPTH_FORMAT, DrawCall, Pipeline};
use crate::texture::{SkyboxTexture, Texture};

/// Per-draw uniforms.
///
/// One of these is written per draw call, each at its own aligned offset.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    /// Model matrix (object to world space).
    pub model: [[f32; 4]; 4],
    /// View matrix (world to camera space).
    pub view: [[f32; 4]; 4],
    /// Projection matrix (camera to clip space).
    pub projection: [[f32; 4]; 4],
    /// RGBA colour multiplied with the sampled texture.
    pub color: [f32; 4],
}

impl From<&DrawCall> for DrawUniforms {
    fn from(call: &DrawCall) -> Self {
        Self {
            model: call.model.to_cols_array_2d(),
            view: call.view.to_cols_array_2d(),
            projection: call.projection.to_cols_array_2d(),
            color: call.color.to_array(),
        }
    }
}

/// Distance between consecutive uniform slots for the given alignment.
pub(crate) fn uniform_stride(alignment: u32) -> u64 {
    let size = std::mem::size_of::<DrawUniforms>() as u64;
    let alignment = alignment.max(1) as u64;
    size.div_ceil(alignment) * alignment
}

/// Mesh and skybox pipelines plus their layouts.
pub struct MeshPass {
    mesh_pipeline: wgpu::RenderPipeline,
    skybox_pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    cube_layout: wgpu::BindGroupLayout,
}

impl MeshPass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });
        let skybox_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Skybox Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/skybox.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_layout =
            Self::sampled_layout(device, "Mesh Texture Layout", wgpu::TextureViewDimension::D2);
        let cube_layout = Self::sampled_layout(
            device,
            "Skybox Texture Layout",
            wgpu::TextureViewDimension::Cube,
        );

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let skybox_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &cube_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = Self::pipeline(
            gpu,
            "Mesh Pipeline",
            &mesh_layout,
            &mesh_shader,
            wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            },
        );
        let skybox_pipeline = Self::pipeline(
            gpu,
            "Skybox Pipeline",
            &skybox_layout,
            &skybox_shader,
            wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            },
        );

        Self {
            mesh_pipeline,
            skybox_pipeline,
            uniform_layout,
            texture_layout,
            cube_layout,
        }
    }

    fn sampled_layout(
        device: &wgpu::Device,
        label: &str,
        view_dimension: wgpu::TextureViewDimension,
    ) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension,
                        multisampled: false,
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
        })
    }

    fn pipeline(
        gpu: &GpuContext,
        label: &str,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        depth: wgpu::DepthStencilState,
    ) -> wgpu::RenderPipeline {
        gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(depth),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    pub(crate) fn pipeline_for(&self, pipeline: Pipeline) -> &wgpu::RenderPipeline {
        match pipeline {
            Pipeline::Mesh => &self.mesh_pipeline,
            Pipeline::Skybox => &self.skybox_pipeline,
        }
    }

    /// Binds the whole uniform buffer; draws pick their slot by offset.
    pub(crate) fn uniform_bind_group(
        &self,
        gpu: &GpuContext,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Uniforms Bind Group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        })
    }

    /// Bind group sampling a 2D view with the given sampler.
    pub(crate) fn texture_bind_group(
        &self,
        gpu: &GpuContext,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    pub(crate) fn default_bind_group(
        &self,
        gpu: &GpuContext,
        texture: &Texture,
    ) -> wgpu::BindGroup {
        self.texture_bind_group(gpu, &texture.view, &texture.sampler)
    }

    pub(crate) fn skybox_bind_group(
        &self,
        gpu: &GpuContext,
        skybox: &SkyboxTexture,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Bind Group"),
            layout: &self.cube_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&skybox.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&skybox.sampler),
                },
            ],
        })
    }
}
