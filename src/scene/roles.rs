//! The two roles a scene entry can play, and the context each is handed.

use std::rc::Rc;

use crate::camera::Camera;
use crate::error::Result;
use crate::input::InputSnapshot;
use crate::render::{DrawCall, RenderDispatch, RenderTargetId};

/// Everything an updatable may read or change during the update phase.
pub struct UpdateContext<'a> {
    /// Seconds since the previous tick.
    pub dt: f32,
    pub input: &'a InputSnapshot,
    pub camera: &'a mut Camera,
}

/// Everything a drawable may use during the draw phase.
///
/// The camera is shared, so drawables cannot move it; any view they request
/// comes from the camera's cache.
pub struct DrawContext<'a> {
    pub camera: &'a Camera,
    pub dispatch: &'a mut dyn RenderDispatch,
    /// The target of the group being drawn.
    pub target: RenderTargetId,
}

impl DrawContext<'_> {
    /// Forwards a draw call to the backend.
    pub fn submit(&mut self, call: DrawCall) -> Result<()> {
        log::trace!("submit {:?} to {:?}", call.shape, self.target);
        self.dispatch.submit(call)
    }
}

/// Something advanced once per tick.
pub trait Updatable {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<()>;
}

/// Something that issues draw calls once per tick.
pub trait Drawable {
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> Result<()>;
}

impl<F> Updatable for F
where
    F: FnMut(&mut UpdateContext<'_>) -> Result<()>,
{
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<()> {
        self(ctx)
    }
}

impl<F> Drawable for F
where
    F: FnMut(&mut DrawContext<'_>) -> Result<()>,
{
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> Result<()> {
        self(ctx)
    }
}

/// A shareable update function for entities of type `T`.
pub type UpdateFn<T> = Rc<dyn Fn(&mut T, &mut UpdateContext<'_>) -> Result<()>>;

/// A shareable draw function for entities of type `T`.
pub type DrawFn<T> = Rc<dyn Fn(&T, &mut DrawContext<'_>) -> Result<()>>;

/// Pairs an entity with the function that updates it.
///
/// The function is reference counted so one behaviour can drive many entities.
pub struct Updater<T> {
    pub target: T,
    func: UpdateFn<T>,
}

impl<T> Updater<T> {
    pub fn new(
        target: T,
        func: impl Fn(&mut T, &mut UpdateContext<'_>) -> Result<()> + 'static,
    ) -> Self {
        Self::shared(target, Rc::new(func))
    }

    pub fn shared(target: T, func: UpdateFn<T>) -> Self {
        Self { target, func }
    }
}

impl<T> Updatable for Updater<T> {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<()> {
        (self.func)(&mut self.target, ctx)
    }
}

/// Pairs an entity with the function that draws it.
///
/// Render helpers such as [`solid`](crate::render::solid) return a [`DrawFn`]
/// that many drawers can share.
pub struct Drawer<T> {
    pub target: T,
    func: DrawFn<T>,
}

impl<T> Drawer<T> {
    pub fn new(target: T, func: impl Fn(&T, &mut DrawContext<'_>) -> Result<()> + 'static) -> Self {
        Self::shared(target, Rc::new(func))
    }

    pub fn shared(target: T, func: DrawFn<T>) -> Self {
        Self { target, func }
    }
}

impl<T> Drawable for Drawer<T> {
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> Result<()> {
        (self.func)(&self.target, ctx)
    }
}
