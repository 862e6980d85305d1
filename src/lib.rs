//! # Vantage
//!
//! **A small 3D kernel: transforms, a cached camera, and a scene loop.**
//!
//! Entities are 4x4 transforms with capability traits layered on top. A
//! [`Camera`] is a rigid entity that caches its world-to-view matrix and only
//! recomputes it after it moves. A [`Scene`] runs updatables, then draws render
//! groups through a [`RenderDispatch`](render::RenderDispatch), which is either
//! the wgpu backend or a recorder for tests.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vantage::*;
//!
//! fn main() -> Result<()> {
//!     run(AppConfig::new().title("Debug"), |ctx| {
//!         let mut scene = ctx.scene();
//!         scene.camera_mut().translate([0.0, 0.0, 2.0]);
//!         scene.add_updatable(ctx.controller());
//!
//!         scene.add_drawable(Drawer::shared(Shape::new(ShapeKind::Skybox), render::skybox()));
//!
//!         let mut cube = Shape::new(ShapeKind::Cube);
//!         cube.scale_uniform(0.25);
//!         scene.add_drawable(Drawer::shared(cube, render::solid(Color::RED)));
//!         Ok(scene)
//!     })
//! }
//! ```
//!
//! ## Conventions
//!
//! - Matrices are column-major, and `m * v` transforms a column vector.
//! - `translate`, `rotate_*` and `scale` act in the entity's local frame.
//! - The camera looks down its local -Z with +Y up.
//! - Projections take a *horizontal* field of view and map depth to `[0, 1]`.

mod app;
mod camera;
mod controller;
mod error;
mod gpu;
mod input;
pub mod math;
mod mesh;
mod mesh_pass;
mod primitives;
pub mod render;
mod scene;
mod texture;
mod transform;

pub use app::{AppConfig, SetupContext, run};
pub use camera::{Camera, ProjectionParams};
pub use controller::{
    CameraController, ControllerConfig, EulerController, IncrementalController, NavigationModel,
};
pub use error::{Error, Result};
pub use gpu::GpuContext;
pub use input::{Input, InputSnapshot, MouseSnapshot};
pub use math::SingularMatrix;
pub use mesh::Mesh;
pub use mesh_pass::{DrawUniforms, MeshPass};
pub use primitives::{Geometry, ShapeKind, Vertex3d};
pub use render::{Color, DrawCall, Pipeline, RenderDispatch, RenderTargetId};
pub use scene::{
    DrawContext, DrawFn, Drawable, DrawableId, Drawer, GroupId, Scene, UpdatableId, UpdateContext,
    UpdateFn, Updatable, Updater,
};
pub use texture::{CubeFace, CubeFaces, SkyboxLoader, SkyboxTexture, Texture};
pub use transform::{Affine, Entity, Rigid, Rotatable, Scalable, Shape, Translatable};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
