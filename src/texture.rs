//! Sampled textures: the flat 2D kind used by the mesh pipeline and the
//! cubemap behind the skybox.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::error::{Error, Result};
use crate::gpu::GpuContext;

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = linear_sampler(gpu, &format!("{label} Sampler"));

        Self {
            view,
            sampler,
            width,
            height,
        }
    }

    /// A 1x1 white texture, sampled by draws that show no target.
    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_rgba(gpu, &[255, 255, 255, 255], 1, 1, "Default White Texture")
    }
}

pub(crate) fn linear_sampler(gpu: &GpuContext, label: &str) -> wgpu::Sampler {
    gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// One face of a cubemap, in wgpu layer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Array layer of this face in a cube texture.
    pub fn layer(self) -> u32 {
        self as u32
    }

    /// Solid colour shown until an image is loaded for the face.
    pub fn placeholder(self) -> [u8; 4] {
        match self {
            CubeFace::PositiveX => [255, 0, 0, 255],
            CubeFace::NegativeX => [0, 255, 0, 255],
            CubeFace::PositiveY => [0, 0, 255, 255],
            CubeFace::NegativeY => [255, 255, 0, 255],
            CubeFace::PositiveZ | CubeFace::NegativeZ => [255, 255, 255, 255],
        }
    }

    /// Conventional image name for the face in a skybox directory.
    pub fn file_name(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "right.jpg",
            CubeFace::NegativeX => "left.jpg",
            CubeFace::PositiveY => "top.jpg",
            CubeFace::NegativeY => "bottom.jpg",
            CubeFace::PositiveZ => "back.jpg",
            CubeFace::NegativeZ => "front.jpg",
        }
    }
}

/// CPU copies of the six faces, kept square and the same size.
///
/// A face larger than the current size grows every face to match; a smaller
/// one is scaled up. Growing means the GPU texture has to be recreated.
#[derive(Debug, Clone)]
pub struct CubeFaces {
    faces: [RgbaImage; 6],
    side: u32,
}

impl Default for CubeFaces {
    fn default() -> Self {
        Self {
            faces: CubeFace::ALL
                .map(|face| RgbaImage::from_pixel(1, 1, image::Rgba(face.placeholder()))),
            side: 1,
        }
    }
}

impl CubeFaces {
    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn face(&self, face: CubeFace) -> &RgbaImage {
        &self.faces[face.layer() as usize]
    }

    /// Replaces one face. Returns true if the cube grew.
    pub fn replace(&mut self, face: CubeFace, image: RgbaImage) -> bool {
        let side = self.side.max(image.width()).max(image.height());
        let grew = side != self.side;
        if grew {
            for existing in &mut self.faces {
                *existing = imageops::resize(existing, side, side, FilterType::Triangle);
            }
            self.side = side;
        }
        self.faces[face.layer() as usize] = if image.dimensions() == (side, side) {
            image
        } else {
            imageops::resize(&image, side, side, FilterType::Triangle)
        };
        grew
    }

    /// All faces, layer after layer.
    pub fn layer_major_bytes(&self) -> Vec<u8> {
        self.faces.iter().flat_map(|face| face.as_raw().iter().copied()).collect()
    }
}

/// The cubemap sampled by the skybox pipeline.
pub struct SkyboxTexture {
    texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    faces: CubeFaces,
    generation: u64,
}

impl SkyboxTexture {
    /// A cubemap showing the placeholder colours.
    pub fn new(gpu: &GpuContext) -> Self {
        let faces = CubeFaces::default();
        let (texture, view) = Self::upload(gpu, &faces);
        Self {
            texture,
            view,
            sampler: linear_sampler(gpu, "Skybox Sampler"),
            faces,
            generation: 0,
        }
    }

    fn upload(gpu: &GpuContext, faces: &CubeFaces) -> (wgpu::Texture, wgpu::TextureView) {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some("Skybox Cubemap"),
                size: wgpu::Extent3d {
                    width: faces.side(),
                    height: faces.side(),
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &faces.layer_major_bytes(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Skybox Cube View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        (texture, view)
    }

    /// Bumped whenever the texture is recreated; bind groups made for an
    /// older generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn faces(&self) -> &CubeFaces {
        &self.faces
    }

    /// Replaces one face with `image`.
    pub fn set_face(&mut self, gpu: &GpuContext, face: CubeFace, image: RgbaImage) {
        if self.faces.replace(face, image) {
            let (texture, view) = Self::upload(gpu, &self.faces);
            self.texture = texture;
            self.view = view;
            self.generation += 1;
            return;
        }

        let side = self.faces.side();
        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: face.layer(),
                },
                aspect: wgpu::TextureAspect::All,
            },
            self.faces.face(face).as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * side),
                rows_per_image: Some(side),
            },
            wgpu::Extent3d {
                width: side,
                height: side,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Loads an image file into one face, blocking until it is decoded.
    pub fn load_face(
        &mut self,
        gpu: &GpuContext,
        face: CubeFace,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        let image = read_face(path)?;
        log::info!("loaded skybox face {:?} from {}", face, path.display());
        self.set_face(gpu, face, image);
        Ok(())
    }
}

fn read_face(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path).map_err(|source| Error::Asset {
        path: path.display().to_string(),
        source,
    })?;
    Ok(image.to_rgba8())
}

type FaceResult = (CubeFace, Result<RgbaImage>);

/// Decodes the faces of a skybox directory on a worker thread.
///
/// The frame loop keeps drawing the placeholders meanwhile and picks up each
/// face with [`drain`](Self::drain) as soon as it has been decoded. Faces are
/// read under their conventional names; a face that is missing or unreadable
/// is logged and left as it was.
pub struct SkyboxLoader {
    dir: PathBuf,
    receiver: Receiver<FaceResult>,
    remaining: usize,
}

impl SkyboxLoader {
    pub fn spawn(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let (sender, receiver) = mpsc::channel();
        let worker_dir = dir.clone();
        thread::Builder::new()
            .name("skybox-loader".into())
            .spawn(move || {
                for face in CubeFace::ALL {
                    let result = read_face(&worker_dir.join(face.file_name()));
                    if sender.send((face, result)).is_err() {
                        // The loader was dropped; nobody wants the rest.
                        return;
                    }
                }
            })
            .map_err(|err| Error::ResourceCreation {
                resource: "skybox loader thread",
                reason: err.to_string(),
            })?;
        log::info!("loading skybox faces from {}", dir.display());

        Ok(Self {
            dir,
            receiver,
            remaining: CubeFace::ALL.len(),
        })
    }

    /// True once every face has been reported, loaded or not.
    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Faces decoded since the last call. Never blocks.
    pub fn drain(&mut self) -> Vec<(CubeFace, RgbaImage)> {
        let mut ready = Vec::new();
        while !self.is_done() {
            match self.receiver.try_recv() {
                Ok(result) => ready.extend(self.accept(result)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.worker_gone(),
            }
        }
        ready
    }

    /// Blocks until the worker has reported every remaining face.
    pub fn wait(&mut self) -> Vec<(CubeFace, RgbaImage)> {
        let mut ready = Vec::new();
        while !self.is_done() {
            match self.receiver.recv() {
                Ok(result) => ready.extend(self.accept(result)),
                Err(_) => self.worker_gone(),
            }
        }
        ready
    }

    fn accept(&mut self, (face, result): FaceResult) -> Option<(CubeFace, RgbaImage)> {
        self.remaining -= 1;
        match result {
            Ok(image) => {
                log::info!("decoded skybox face {face:?} from {}", self.dir.display());
                Some((face, image))
            }
            Err(err) => {
                log::warn!("keeping placeholder for {face:?}: {err}");
                None
            }
        }
    }

    fn worker_gone(&mut self) {
        log::warn!(
            "skybox loader for {} stopped with {} faces outstanding",
            self.dir.display(),
            self.remaining
        );
        self.remaining = 0;
    }
}
