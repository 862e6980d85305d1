//! Offscreen colour targets and the depth buffers that go with them.

use crate::gpu::GpuContext;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A depth buffer that follows the size of the target it belongs to.
pub(crate) struct DepthBuffer {
    pub(crate) view: wgpu::TextureView,
    size: (u32, u32),
}

impl DepthBuffer {
    pub(crate) fn new(gpu: &GpuContext, width: u32, height: u32, label: &str) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            size: (width, height),
        }
    }

    /// Recreates the buffer if its size no longer matches.
    pub(crate) fn ensure_size(&mut self, gpu: &GpuContext, width: u32, height: u32, label: &str) {
        if self.size != (width, height) {
            *self = Self::new(gpu, width, height, label);
        }
    }
}

/// An offscreen render target.
///
/// The colour texture can be rendered to (as an attachment) and sampled from
/// (as a texture binding), so one group can draw into it and a later group
/// can show it on a shape. It uses the surface format, so the same pipelines
/// serve both the screen and offscreen targets. Targets keep the size they
/// were created with.
pub(crate) struct RenderTarget {
    pub(crate) view: wgpu::TextureView,
    pub(crate) depth: DepthBuffer,
}

impl RenderTarget {
    /// Creates a target of the given size in the surface format.
    pub(crate) fn new(gpu: &GpuContext, width: u32, height: u32, label: &str) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            depth: DepthBuffer::new(gpu, width, height, &format!("{label} Depth")),
        }
    }
}
