use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::mesh::Mesh;
use crate::mesh_pass::{DrawUniforms, MeshPass, uniform_stride};
use crate::primitives::ShapeKind;
use crate::texture::{self, CubeFace, SkyboxLoader, SkyboxTexture, Texture};

use super::registry::ShapeRegistry;
use super::target::{DepthBuffer, RenderTarget};
use super::{ClearColor, DrawCall, Pipeline, RenderDispatch, RenderTargetId};

/// What a draw samples in bind group 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureBinding {
    /// The 1x1 white texture, so the colour shows unchanged.
    White,
    /// An offscreen target.
    Target(u32),
    /// The skybox cubemap.
    Skybox,
}

impl TextureBinding {
    pub fn for_call(call: &DrawCall) -> Self {
        match (call.pipeline, call.texture) {
            (Pipeline::Skybox, _) => TextureBinding::Skybox,
            (Pipeline::Mesh, Some(RenderTargetId::Offscreen(id))) => TextureBinding::Target(id),
            (Pipeline::Mesh, _) => TextureBinding::White,
        }
    }
}

/// Which bindings a draw has to re-issue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rebind {
    pub pipeline: bool,
    pub vertices: bool,
    pub texture: bool,
}

/// Tracks what is bound inside one render pass so consecutive draws that
/// share a pipeline, a shape or a texture don't bind it again.
#[derive(Clone, Debug, Default)]
pub struct BindState {
    pipeline: Option<Pipeline>,
    shape: Option<ShapeKind>,
    texture: Option<TextureBinding>,
}

impl BindState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything; a new render pass starts with nothing bound.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records `call` as bound and reports what changed since the previous draw.
    pub fn plan(&mut self, call: &DrawCall) -> Rebind {
        let texture = TextureBinding::for_call(call);
        let rebind = Rebind {
            pipeline: self.pipeline != Some(call.pipeline),
            vertices: self.shape != Some(call.shape),
            texture: self.texture != Some(texture),
        };
        self.pipeline = Some(call.pipeline);
        self.shape = Some(call.shape);
        self.texture = Some(texture);
        rebind
    }
}

struct RecordedGroup {
    target: RenderTargetId,
    clear: ClearColor,
    calls: Vec<DrawCall>,
}

/// Per-draw uniform slots in one buffer, grown on demand.
struct UniformSlots {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl UniformSlots {
    fn new(gpu: &GpuContext, pass: &MeshPass, capacity: usize) -> Self {
        let stride = uniform_stride(gpu.device.limits().min_uniform_buffer_offset_alignment);
        let capacity = capacity.max(1);
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = pass.uniform_bind_group(gpu, &buffer);
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }

    fn ensure_capacity(&mut self, gpu: &GpuContext, pass: &MeshPass, slots: usize) {
        if slots > self.capacity {
            log::debug!("growing draw uniforms to {} slots", slots.next_power_of_two());
            *self = Self::new(gpu, pass, slots.next_power_of_two());
        }
    }

    fn write(&self, gpu: &GpuContext, calls: impl Iterator<Item = DrawUniforms>) {
        let stride = self.stride as usize;
        let mut bytes = Vec::new();
        for uniforms in calls {
            let start = bytes.len();
            bytes.extend_from_slice(bytemuck::bytes_of(&uniforms));
            bytes.resize(start + stride, 0);
        }
        if !bytes.is_empty() {
            gpu.queue.write_buffer(&self.buffer, 0, &bytes);
        }
    }

    fn offset(&self, slot: usize) -> u32 {
        (slot as u64 * self.stride) as u32
    }
}

/// Renders scenes through wgpu.
///
/// During the draw phase the dispatch only records: each `begin_target`
/// opens a group and each `submit` appends to it, uploading the shape's mesh
/// the first time it is seen. [`present`](Self::present) then encodes one
/// render pass per group, in order, and presents the surface.
pub struct WgpuDispatch {
    gpu: GpuContext,
    pass: MeshPass,
    meshes: ShapeRegistry<Mesh>,
    targets: HashMap<u32, RenderTarget>,
    target_bind_groups: HashMap<u32, wgpu::BindGroup>,
    target_sampler: wgpu::Sampler,
    white_bind_group: wgpu::BindGroup,
    skybox: SkyboxTexture,
    skybox_bind_group: (u64, wgpu::BindGroup),
    skybox_loader: Option<SkyboxLoader>,
    depth: DepthBuffer,
    uniforms: UniformSlots,
    frame: Vec<RecordedGroup>,
}

impl WgpuDispatch {
    pub fn new(gpu: GpuContext) -> Self {
        let pass = MeshPass::new(&gpu);
        let white = Texture::white(&gpu);
        let white_bind_group = pass.default_bind_group(&gpu, &white);
        let skybox = SkyboxTexture::new(&gpu);
        let skybox_bind_group = (skybox.generation(), pass.skybox_bind_group(&gpu, &skybox));
        let depth = DepthBuffer::new(&gpu, gpu.width(), gpu.height(), "Screen Depth");
        let uniforms = UniformSlots::new(&gpu, &pass, 64);
        let target_sampler = texture::linear_sampler(&gpu, "Offscreen Target Sampler");
        log::info!("render backend ready ({:?})", gpu.format());

        Self {
            gpu,
            pass,
            meshes: ShapeRegistry::new(),
            targets: HashMap::new(),
            target_bind_groups: HashMap::new(),
            target_sampler,
            white_bind_group,
            skybox,
            skybox_bind_group,
            skybox_loader: None,
            depth,
            uniforms,
            frame: Vec::new(),
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// The cubemap behind every skybox draw.
    pub fn skybox(&self) -> &SkyboxTexture {
        &self.skybox
    }

    /// Replaces one skybox face with an image file. Takes effect next present.
    pub fn load_skybox_face(&mut self, face: CubeFace, path: impl AsRef<Path>) -> Result<()> {
        self.skybox.load_face(&self.gpu, face, path)
    }

    /// Starts decoding the skybox faces found in `dir` in the background.
    ///
    /// Placeholder colours stay on screen until each face arrives; faces are
    /// applied at the start of the next [`present`](Self::present) after they
    /// are decoded. Starting a new load abandons the previous one.
    pub fn load_skybox_dir(&mut self, dir: impl Into<PathBuf>) -> Result<()> {
        self.skybox_loader = Some(SkyboxLoader::spawn(dir)?);
        Ok(())
    }

    /// Applies any skybox faces decoded since the last frame.
    fn apply_loaded_faces(&mut self) {
        let Some(loader) = self.skybox_loader.as_mut() else {
            return;
        };
        for (face, image) in loader.drain() {
            self.skybox.set_face(&self.gpu, face, image);
        }
        if loader.is_done() {
            self.skybox_loader = None;
        }
    }

    /// Registers an offscreen target that groups can draw into and meshes
    /// can sample. Re-adding an id replaces it.
    pub fn add_offscreen_target(&mut self, id: u32, width: u32, height: u32) -> RenderTargetId {
        let label = format!("Offscreen Target {id}");
        let target = RenderTarget::new(&self.gpu, width, height, &label);
        let bind_group = self
            .pass
            .texture_bind_group(&self.gpu, &target.view, &self.target_sampler);
        self.target_bind_groups.insert(id, bind_group);
        self.targets.insert(id, target);
        RenderTargetId::Offscreen(id)
    }

    /// Resizes the surface and the screen depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.depth
            .ensure_size(&self.gpu, self.gpu.width(), self.gpu.height(), "Screen Depth");
    }

    fn knows(&self, target: RenderTargetId) -> bool {
        match target {
            RenderTargetId::Screen => true,
            RenderTargetId::Offscreen(id) => self.targets.contains_key(&id),
        }
    }

    /// Encodes everything recorded since the last present and shows it.
    ///
    /// A lost or outdated surface is reconfigured and the frame dropped. Running
    /// out of memory is fatal.
    pub fn present(&mut self) -> Result<()> {
        let frame = std::mem::take(&mut self.frame);

        self.apply_loaded_faces();
        if self.skybox_bind_group.0 != self.skybox.generation() {
            self.skybox_bind_group = (
                self.skybox.generation(),
                self.pass.skybox_bind_group(&self.gpu, &self.skybox),
            );
        }

        let draws: usize = frame.iter().map(|group| group.calls.len()).sum();
        self.uniforms.ensure_capacity(&self.gpu, &self.pass, draws);
        self.uniforms.write(
            &self.gpu,
            frame.iter().flat_map(|group| group.calls.iter().map(DrawUniforms::from)),
        );

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                self.gpu.resize(self.gpu.width(), self.gpu.height());
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(Error::ResourceCreation {
                    resource: "surface texture",
                    reason: "out of memory".into(),
                });
            }
            Err(err) => {
                log::warn!("dropping frame: {err}");
                return Ok(());
            }
        };
        let screen_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        let mut slot = 0;
        let mut screen_cleared = false;
        let mut bind_state = BindState::new();
        for group in &frame {
            let (color_view, depth_view) = match group.target {
                RenderTargetId::Screen => {
                    screen_cleared = true;
                    (&screen_view, &self.depth.view)
                }
                RenderTargetId::Offscreen(id) => match self.targets.get(&id) {
                    Some(target) => (&target.view, &target.depth.view),
                    None => {
                        slot += group.calls.len();
                        continue;
                    }
                },
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Group Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(group.clear.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            bind_state.reset();
            for call in &group.calls {
                let offset = self.uniforms.offset(slot);
                slot += 1;
                let Some(mesh) = self.meshes.get(call.shape) else {
                    continue;
                };

                let rebind = bind_state.plan(call);
                if rebind.pipeline {
                    render_pass.set_pipeline(self.pass.pipeline_for(call.pipeline));
                }
                render_pass.set_bind_group(0, &self.uniforms.bind_group, &[offset]);
                if rebind.texture {
                    let bind_group = match TextureBinding::for_call(call) {
                        TextureBinding::White => &self.white_bind_group,
                        TextureBinding::Skybox => &self.skybox_bind_group.1,
                        TextureBinding::Target(id) => self
                            .target_bind_groups
                            .get(&id)
                            .unwrap_or(&self.white_bind_group),
                    };
                    render_pass.set_bind_group(1, bind_group, &[]);
                }
                if rebind.vertices {
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                }
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        if !screen_cleared {
            // Nothing drew to the screen this frame; still clear it.
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Screen Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &screen_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ClearColor::default().to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl RenderDispatch for WgpuDispatch {
    fn begin_target(&mut self, target: RenderTargetId, clear: ClearColor) -> Result<()> {
        if !self.knows(target) {
            return Err(Error::UnknownTarget(target));
        }
        self.frame.push(RecordedGroup {
            target,
            clear,
            calls: Vec::new(),
        });
        Ok(())
    }

    fn submit(&mut self, call: DrawCall) -> Result<()> {
        let current = self.frame.last().map(|group| group.target);
        if let Some(source) = call.texture {
            if source == RenderTargetId::Screen || !self.knows(source) {
                return Err(Error::UnknownTarget(source));
            }
            if current == Some(source) {
                return Err(Error::entity(format!(
                    "{source:?} cannot be sampled while it is being drawn into"
                )));
            }
        }

        let gpu = &self.gpu;
        self.meshes
            .get_or_init(call.shape, |kind| Ok(Mesh::shape(gpu, kind)))?;

        match self.frame.last_mut() {
            Some(group) => group.calls.push(call),
            None => self.frame.push(RecordedGroup {
                target: RenderTargetId::Screen,
                clear: ClearColor::default(),
                calls: vec![call],
            }),
        }
        Ok(())
    }
}
