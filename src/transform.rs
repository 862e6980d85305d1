//! Entities that own a transform, and the capabilities that mutate it.
//!
//! Every entity embeds one [`Mat4`] and exposes it through [`Entity`]. Motion
//! is split into capability traits so the type decides what an entity may do:
//!
//! - [`Translatable`] and [`Rotatable`] are available on every entity.
//! - [`Scalable`] is only implemented for [`Affine`] and [`Shape`]. A [`Rigid`]
//!   entity cannot be scaled, so its rotation block stays orthonormal.
//!
//! All operations post-multiply, so they act along the entity's *own* axes:
//! `translate(Vec3::NEG_Z)` moves an entity one unit along whatever direction
//! it currently faces. [`Rotatable::rotate_world`] is the exception; it rotates
//! about a world-space axis through the entity's position.
//!
//! # Example
//!
//! ```
//! use vantage::{Entity, Rigid, Rotatable, Translatable, Vec3};
//!
//! let mut body = Rigid::new();
//! body.rotate_y(std::f32::consts::FRAC_PI_2);
//! body.translate(Vec3::NEG_Z); // "forward", which now points along world -X
//! assert!(body.position().abs_diff_eq(Vec3::NEG_X, 1e-6));
//! ```

use glam::{Mat4, Vec3};

use crate::error::Result;
use crate::math;
use crate::primitives::ShapeKind;

pub(crate) mod sealed {
    use glam::Mat4;

    /// Write access to an entity's transform. Only reachable inside the crate,
    /// so outside code can move entities through the motion traits and
    /// nothing else.
    pub trait TransformMut {
        /// Implementors that cache values derived from the transform must
        /// invalidate them here.
        fn transform_mut(&mut self) -> &mut Mat4;
    }
}

use sealed::TransformMut;

/// Anything that owns exactly one local-to-world transform.
///
/// The trait is sealed: entities are the types defined in this crate, and the
/// transform can only change through [`Translatable`], [`Rotatable`] and
/// [`Scalable`]. Raw writes do not compile outside the crate:
///
/// ```compile_fail
/// use vantage::{Entity, Mat4, Rigid};
///
/// let mut body = Rigid::new();
/// *body.transform_mut() = Mat4::from_scale([2.0, 0.0, 1.0].into());
/// ```
pub trait Entity: TransformMut {
    fn transform(&self) -> &Mat4;

    /// World-space position (the translation column).
    fn position(&self) -> Vec3 {
        math::translation_of(*self.transform())
    }

    /// Local +X in world space.
    fn right(&self) -> Vec3 {
        self.transform().x_axis.truncate().normalize_or_zero()
    }

    fn left(&self) -> Vec3 {
        -self.right()
    }

    /// Local +Y in world space.
    fn up(&self) -> Vec3 {
        self.transform().y_axis.truncate().normalize_or_zero()
    }

    fn down(&self) -> Vec3 {
        -self.up()
    }

    /// Local -Z in world space; the direction the entity faces.
    fn forward(&self) -> Vec3 {
        -self.backward()
    }

    /// Local +Z in world space.
    fn backward(&self) -> Vec3 {
        self.transform().z_axis.truncate().normalize_or_zero()
    }

    /// Inverse of the transform. Fails only if the transform has become
    /// singular, which valid compositions never produce.
    fn inverse_transform(&self) -> Result<Mat4> {
        Ok(math::invert(*self.transform())?)
    }
}

/// Movement along the entity's local axes.
pub trait Translatable: Entity {
    fn translate(&mut self, delta: impl Into<Vec3>) {
        let m = self.transform_mut();
        *m = math::translate(*m, delta.into());
    }
}

/// Rotation about local axes, plus world-axis rotation in place.
pub trait Rotatable: Entity {
    fn rotate_x(&mut self, radians: f32) {
        let m = self.transform_mut();
        *m = math::rotate_x(*m, radians);
    }

    fn rotate_y(&mut self, radians: f32) {
        let m = self.transform_mut();
        *m = math::rotate_y(*m, radians);
    }

    fn rotate_z(&mut self, radians: f32) {
        let m = self.transform_mut();
        *m = math::rotate_z(*m, radians);
    }

    /// Rotates about an arbitrary local axis. The axis must be non-zero.
    fn rotate_axis(&mut self, radians: f32, axis: Vec3) {
        let m = self.transform_mut();
        *m = math::rotate_axis(*m, radians, axis);
    }

    /// Rotates about a world-space axis passing through the entity's position.
    ///
    /// The translation is lifted out, the rotation is pre-multiplied, and the
    /// translation is put back, so the entity turns in place rather than
    /// orbiting the world origin.
    fn rotate_world(&mut self, radians: f32, axis: Vec3) {
        let m = self.transform_mut();
        let position = m.w_axis;
        let rotated = math::multiply(
            math::rotation_axis(radians, axis),
            math::without_translation(*m),
        );
        *m = rotated;
        m.w_axis = position;
    }
}

/// Scaling along local axes. Deliberately not implemented for [`Rigid`].
pub trait Scalable: Entity {
    fn scale(&mut self, factors: impl Into<Vec3>) {
        let m = self.transform_mut();
        *m = math::scale(*m, factors.into());
    }

    fn scale_uniform(&mut self, factor: f32) {
        self.scale(Vec3::splat(factor));
    }
}

impl<T: Entity + ?Sized> Translatable for T {}
impl<T: Entity + ?Sized> Rotatable for T {}

/// A rotation-and-translation-only entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rigid {
    transform: Mat4,
}

impl Rigid {
    pub fn new() -> Self {
        Self::default()
    }

    /// A rigid entity placed at `position`.
    pub fn at(position: impl Into<Vec3>) -> Self {
        let mut rigid = Self::new();
        rigid.translate(position);
        rigid
    }
}

impl Default for Rigid {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
        }
    }
}

impl Entity for Rigid {
    fn transform(&self) -> &Mat4 {
        &self.transform
    }
}

impl TransformMut for Rigid {
    fn transform_mut(&mut self) -> &mut Mat4 {
        &mut self.transform
    }
}

/// A rigid entity that may also carry non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    transform: Mat4,
}

impl Affine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
        }
    }
}

impl From<Rigid> for Affine {
    fn from(rigid: Rigid) -> Self {
        Self {
            transform: rigid.transform,
        }
    }
}

impl Entity for Affine {
    fn transform(&self) -> &Mat4 {
        &self.transform
    }
}

impl TransformMut for Affine {
    fn transform_mut(&mut self) -> &mut Mat4 {
        &mut self.transform
    }
}

impl Scalable for Affine {}

/// A drawable primitive: an affine entity tagged with the shape it renders as.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shape {
    kind: ShapeKind,
    transform: Mat4,
}

impl Shape {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            transform: Mat4::IDENTITY,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }
}

impl Entity for Shape {
    fn transform(&self) -> &Mat4 {
        &self.transform
    }
}

impl TransformMut for Shape {
    fn transform_mut(&mut self) -> &mut Mat4 {
        &mut self.transform
    }
}

impl Scalable for Shape {}
