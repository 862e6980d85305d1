//! GPU upload of primitive geometry.
//!
//! [`Geometry`] stays on the CPU; a [`Mesh`] is the same data in vertex and
//! index buffers. The render backend creates one `Mesh` per [`ShapeKind`] the
//! first time that shape is drawn.
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |

use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;
use crate::primitives::{Geometry, ShapeKind, Vertex3d};

impl Vertex3d {
    /// The wgpu vertex buffer layout for [`Vertex3d`].
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// GPU-resident geometry with vertex and index buffers.
///
/// Immutable after creation. All built-in shapes wind counter-clockwise when
/// seen from the side they are meant to be viewed from.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Uploads raw vertex and index data. An empty mesh draws nothing.
    pub fn new(gpu: &GpuContext, label: &str, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn from_geometry(gpu: &GpuContext, label: &str, geometry: &Geometry) -> Self {
        Self::new(gpu, label, &geometry.vertices, &geometry.indices)
    }

    /// Builds and uploads the geometry for a built-in shape.
    pub fn shape(gpu: &GpuContext, kind: ShapeKind) -> Self {
        Self::from_geometry(gpu, kind.label(), &kind.geometry())
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_vertex_struct() {
        let layout = Vertex3d::LAYOUT;
        assert_eq!(layout.array_stride, 32);
        assert_eq!(
            layout.attributes.iter().map(|a| a.offset).collect::<Vec<_>>(),
            vec![
                std::mem::offset_of!(Vertex3d, position) as u64,
                std::mem::offset_of!(Vertex3d, normal) as u64,
                std::mem::offset_of!(Vertex3d, uv) as u64,
            ]
        );
    }
}
