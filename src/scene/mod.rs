//! Scenes: one camera plus the entities that update and draw each frame.
//!
//! A [`Scene`] holds an ordered list of [`Updatable`]s and an ordered list of
//! render groups, each group being a render target, a clear colour and its
//! [`Drawable`]s. [`Scene::tick`] runs the update phase to completion, then the
//! draw phase, so every drawable sees the state of the current tick.
//!
//! Closures can play either role directly. For the common "this entity is
//! drawn by that function" case, [`Drawer`] and [`Updater`] pair an entity with
//! a shareable function.
//!
//! # Example
//!
//! ```
//! use vantage::render::{self, RecordingDispatch};
//! use vantage::{Camera, Drawer, InputSnapshot, Scalable, Scene, Shape, ShapeKind};
//!
//! let mut scene = Scene::new(Camera::default());
//!
//! let mut cube = Shape::new(ShapeKind::Cube);
//! cube.scale_uniform(0.25);
//! scene.add_drawable(Drawer::shared(cube, render::solid([1.0, 0.0, 0.0, 1.0].into())));
//!
//! let mut dispatch = RecordingDispatch::default();
//! scene.tick(0.016, &InputSnapshot::idle(), &mut dispatch).unwrap();
//! assert_eq!(dispatch.calls().len(), 1);
//! ```

mod roles;
mod scene;

pub use roles::{DrawContext, DrawFn, Drawable, Drawer, UpdateContext, UpdateFn, Updatable, Updater};
pub use scene::{DrawableId, GroupId, Scene, UpdatableId};
