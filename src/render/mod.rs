//! The narrow interface between drawables and a graphics backend.
//!
//! Drawables never touch GPU objects. They describe what to draw as a
//! [`DrawCall`] (which shape, which pipeline, which matrices and colour) and
//! hand it to a [`RenderDispatch`]. The scene tells the dispatch when a new
//! render target begins so it can clear it.
//!
//! Two dispatches ship with the crate:
//!
//! - [`WgpuDispatch`] renders through wgpu.
//! - [`RecordingDispatch`] only records, for tests and headless runs.
//!
//! The helpers at the bottom of this module build the usual draw functions:
//! [`solid`] for a flat-coloured shape, [`textured`] for a shape showing an
//! offscreen target, and [`skybox`] for the background cube.

mod recording;
mod registry;
mod target;
mod wgpu_dispatch;

pub use recording::RecordingDispatch;
pub use registry::ShapeRegistry;
pub(crate) use target::DEPTH_FORMAT;
pub use wgpu_dispatch::{BindState, Rebind, TextureBinding, WgpuDispatch};

use std::rc::Rc;

use glam::Mat4;

use crate::error::Result;
use crate::primitives::ShapeKind;
use crate::scene::{DrawContext, DrawFn};
use crate::transform::{Entity, Shape};

/// Where a group of draws ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTargetId {
    /// The window surface.
    Screen,
    /// An offscreen colour target that later draws can sample.
    Offscreen(u32),
}

/// An RGBA colour with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub(crate) fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// The colour a render target is cleared to before its group draws.
pub type ClearColor = Color;

/// Which pipeline a draw goes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pipeline {
    /// Depth-tested, back-face culled, optionally textured.
    Mesh,
    /// Cubemap-sampled, drawn at the far plane without writing depth.
    Skybox,
}

/// One draw, fully described.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub shape: ShapeKind,
    pub pipeline: Pipeline,
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub color: Color,
    /// Offscreen target to sample instead of the default white texture.
    pub texture: Option<RenderTargetId>,
}

/// A graphics backend as seen by the scene.
pub trait RenderDispatch {
    /// Starts drawing into `target`, clearing it to `clear`.
    ///
    /// Fails with [`Error::UnknownTarget`](crate::Error::UnknownTarget) if the
    /// backend has no such target.
    fn begin_target(&mut self, target: RenderTargetId, clear: ClearColor) -> Result<()>;

    /// Queues a draw into the current target.
    fn submit(&mut self, call: DrawCall) -> Result<()>;
}

/// Submits `shape` through the mesh pipeline in a flat colour.
pub fn draw_shape(ctx: &mut DrawContext<'_>, shape: &Shape, color: Color) -> Result<()> {
    let call = DrawCall {
        shape: shape.kind(),
        pipeline: Pipeline::Mesh,
        model: *shape.transform(),
        view: ctx.camera.world_to_view()?,
        projection: ctx.camera.projection(),
        color,
        texture: None,
    };
    ctx.submit(call)
}

/// Submits `shape` through the mesh pipeline, sampling `source`.
pub fn draw_textured(
    ctx: &mut DrawContext<'_>,
    shape: &Shape,
    source: RenderTargetId,
) -> Result<()> {
    let call = DrawCall {
        shape: shape.kind(),
        pipeline: Pipeline::Mesh,
        model: *shape.transform(),
        view: ctx.camera.world_to_view()?,
        projection: ctx.camera.projection(),
        color: Color::WHITE,
        texture: Some(source),
    };
    ctx.submit(call)
}

/// Submits `shape` through the skybox pipeline with the translation-free view.
pub fn draw_skybox(ctx: &mut DrawContext<'_>, shape: &Shape) -> Result<()> {
    let call = DrawCall {
        shape: shape.kind(),
        pipeline: Pipeline::Skybox,
        model: *shape.transform(),
        view: ctx.camera.skybox_world_to_view()?,
        projection: ctx.camera.projection(),
        color: Color::WHITE,
        texture: None,
    };
    ctx.submit(call)
}

/// A draw function bound to `color`, shareable between drawers.
pub fn solid(color: Color) -> DrawFn<Shape> {
    Rc::new(move |shape: &Shape, ctx: &mut DrawContext<'_>| {
        draw_shape(ctx, shape, color)
    })
}

/// A draw function that shows `source` on the shape.
pub fn textured(source: RenderTargetId) -> DrawFn<Shape> {
    Rc::new(move |shape: &Shape, ctx: &mut DrawContext<'_>| {
        draw_textured(ctx, shape, source)
    })
}

/// A draw function for the skybox cube.
pub fn skybox() -> DrawFn<Shape> {
    Rc::new(|shape: &Shape, ctx: &mut DrawContext<'_>| draw_skybox(ctx, shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::math;
    use crate::transform::Translatable;
    use glam::Vec3;

    #[test]
    fn helpers_fill_draw_calls() {
        let mut camera = Camera::default();
        camera.translate([1.0, 2.0, 3.0]);
        let mut dispatch = RecordingDispatch::default();
        let mut ctx = DrawContext {
            camera: &camera,
            dispatch: &mut dispatch,
            target: RenderTargetId::Screen,
        };

        let mut cube = Shape::new(ShapeKind::Cube);
        cube.translate([0.0, 0.0, -5.0]);
        solid(Color::RED)(&cube, &mut ctx).unwrap();
        skybox()(&Shape::new(ShapeKind::Skybox), &mut ctx).unwrap();
        textured(RenderTargetId::Offscreen(1))(&Shape::new(ShapeKind::Quad), &mut ctx).unwrap();

        let calls = dispatch.calls();
        assert_eq!(calls.len(), 3);

        assert_eq!(calls[0].pipeline, Pipeline::Mesh);
        assert_eq!(calls[0].color, Color::RED);
        assert_eq!(calls[0].model, *cube.transform());
        assert_eq!(calls[0].view, camera.world_to_view().unwrap());

        assert_eq!(calls[1].pipeline, Pipeline::Skybox);
        assert_eq!(math::translation_of(calls[1].view), Vec3::ZERO);

        assert_eq!(calls[2].texture, Some(RenderTargetId::Offscreen(1)));
        assert_eq!(camera.view_recomputations(), 1);
    }

    #[test]
    fn color_conversions() {
        let c: Color = [0.5, 0.25, 1.0, 1.0].into();
        assert_eq!(c, Color::rgb(0.5, 0.25, 1.0));
        assert_eq!(c.to_array(), [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(Color::default(), Color::BLACK);
    }
}
