//! A perspective camera with a memoized world-to-view matrix.
//!
//! The camera is an ordinary [`Entity`]: controllers move it with the same
//! translate/rotate operations as any other object. What it adds is a cache of
//! the inverse transform. [`Camera::world_to_view`] inverts at most once per
//! transform change, however many drawables ask for it during a frame.
//!
//! # Example
//!
//! ```
//! use vantage::{Camera, ProjectionParams, Translatable};
//!
//! let mut camera = Camera::new(ProjectionParams::default().aspect(16.0 / 9.0));
//! camera.translate([0.0, 0.0, 2.0]);
//!
//! let view = camera.world_to_view().unwrap();
//! let again = camera.world_to_view().unwrap();
//! assert_eq!(view, again);
//! assert_eq!(camera.view_recomputations(), 1);
//! ```

use std::cell::Cell;

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};
use crate::math;
use crate::transform::Entity;
use crate::transform::sealed::TransformMut;

/// Perspective projection parameters.
///
/// `fov` is the *horizontal* field of view in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionParams {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            fov: std::f32::consts::FRAC_PI_2,
            aspect: 1.0,
            near: 0.1,
            far: 32.0,
        }
    }
}

impl ProjectionParams {
    /// Set the horizontal field of view in radians.
    pub fn fov(mut self, radians: f32) -> Self {
        self.fov = radians;
        self
    }

    /// Set the horizontal field of view in degrees.
    pub fn fov_degrees(mut self, degrees: f32) -> Self {
        self.fov = degrees.to_radians();
        self
    }

    pub fn aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Set near and far clipping planes.
    pub fn clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Rejects parameters that would produce a degenerate projection.
    pub fn validate(&self) -> Result<()> {
        if !(self.fov > 0.0 && self.fov < std::f32::consts::PI) {
            return Err(Error::Config(format!(
                "field of view {} must lie strictly between 0 and π",
                self.fov
            )));
        }
        if !(self.aspect > 0.0 && self.aspect.is_finite()) {
            return Err(Error::Config(format!(
                "aspect ratio {} must be positive",
                self.aspect
            )));
        }
        if !(self.near > 0.0 && self.far > self.near && self.far.is_finite()) {
            return Err(Error::Config(format!(
                "clip planes must satisfy 0 < near < far (near {}, far {})",
                self.near, self.far
            )));
        }
        Ok(())
    }

    /// The projection matrix these parameters describe.
    pub fn matrix(&self) -> Mat4 {
        math::perspective(self.fov, self.aspect, self.near, self.far)
    }
}

const ORIENTATION_EPSILON: f32 = 1e-5;

#[derive(Clone, Copy, Debug)]
struct ViewCache {
    snapshot: Mat4,
    inverse: Mat4,
    valid: bool,
}

impl ViewCache {
    const EMPTY: Self = Self {
        snapshot: Mat4::IDENTITY,
        inverse: Mat4::IDENTITY,
        valid: false,
    };
}

/// A camera entity: transform, projection, and a lazily inverted view.
///
/// The cache lives in a [`Cell`], so reading the view only needs `&self`. The
/// camera is `!Sync` as a consequence; it belongs to the single thread that
/// runs the frame loop.
#[derive(Debug)]
pub struct Camera {
    transform: Mat4,
    params: ProjectionParams,
    projection: Mat4,
    cache: Cell<ViewCache>,
    recomputations: Cell<u64>,
    yaw: f32,
    pitch: f32,
}

impl Camera {
    /// Creates a camera at the origin looking down -Z.
    ///
    /// The projection is computed here once. Parameters are assumed valid;
    /// see [`ProjectionParams::validate`].
    pub fn new(params: ProjectionParams) -> Self {
        Self {
            transform: Mat4::IDENTITY,
            params,
            projection: params.matrix(),
            cache: Cell::new(ViewCache::EMPTY),
            recomputations: Cell::new(0),
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn params(&self) -> &ProjectionParams {
        &self.params
    }

    /// Replaces the projection parameters and recomputes the projection.
    pub fn set_projection(&mut self, params: ProjectionParams) {
        self.params = params;
        self.projection = params.matrix();
    }

    /// Recomputes the projection for a new viewport aspect ratio.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.set_projection(self.params.aspect(aspect));
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// The inverse of the camera transform.
    ///
    /// Inverts only when the transform changed since the last call; otherwise
    /// returns the cached matrix without touching the recompute counter.
    pub fn world_to_view(&self) -> Result<Mat4> {
        let cache = self.cache.get();
        if cache.valid {
            debug_assert!(
                cache.snapshot == self.transform,
                "view cache marked valid for a stale transform"
            );
            return Ok(cache.inverse);
        }

        let inverse = self.inverse_transform()?;
        self.cache.set(ViewCache {
            snapshot: self.transform,
            inverse,
            valid: true,
        });
        self.recomputations.set(self.recomputations.get() + 1);
        log::debug!(
            "camera view recomputed ({} total)",
            self.recomputations.get()
        );
        Ok(inverse)
    }

    /// The view with its translation removed, for geometry drawn at infinity.
    pub fn skybox_world_to_view(&self) -> Result<Mat4> {
        Ok(math::without_translation(self.world_to_view()?))
    }

    /// `projection · world_to_view`.
    pub fn view_projection(&self) -> Result<Mat4> {
        Ok(math::multiply(self.projection, self.world_to_view()?))
    }

    /// How many times the view has been inverted.
    pub fn view_recomputations(&self) -> u64 {
        self.recomputations.get()
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Rebuilds the rotation as `rotation_y(yaw) · rotation_x(pitch)`,
    /// keeping the current position.
    ///
    /// Angles are stored as given; range handling belongs to the controller.
    /// Incremental rotations do not update these fields until
    /// [`sync_orientation`](Self::sync_orientation) is called.
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
        let position = self.transform.w_axis;
        let m = self.transform_mut();
        *m = math::multiply(math::rotation_y(yaw), math::rotation_x(pitch));
        m.w_axis = position;
    }

    /// Re-derives yaw and pitch from the view direction when the rotation no
    /// longer matches the stored angles, e.g. after `rotate_x`. Returns true
    /// if the angles changed. The transform itself is not written.
    ///
    /// Roll has no yaw/pitch equivalent and is dropped by the next
    /// [`set_orientation`](Self::set_orientation).
    pub fn sync_orientation(&mut self) -> bool {
        let expected = math::multiply(math::rotation_y(self.yaw), math::rotation_x(self.pitch));
        let current = math::without_translation(self.transform);
        if current.abs_diff_eq(expected, ORIENTATION_EPSILON) {
            return false;
        }

        let forward = self.forward();
        let horizontal = Vec3::new(forward.x, 0.0, forward.z);
        self.yaw = if horizontal.length_squared() > ORIENTATION_EPSILON {
            (-forward.x).atan2(-forward.z)
        } else {
            // Looking straight up or down: the right vector still carries the heading.
            let right = self.right();
            (-right.z).atan2(right.x)
        };
        self.pitch = forward.y.clamp(-1.0, 1.0).asin();
        true
    }

    /// Places the camera at `position` without changing its orientation.
    pub fn set_position(&mut self, position: impl Into<Vec3>) {
        let position = position.into();
        self.transform_mut().w_axis = position.extend(1.0);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(ProjectionParams::default())
    }
}

impl Entity for Camera {
    fn transform(&self) -> &Mat4 {
        &self.transform
    }
}

impl TransformMut for Camera {
    fn transform_mut(&mut self) -> &mut Mat4 {
        self.cache.get_mut().valid = false;
        &mut self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Rotatable, Translatable};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn repeated_reads_hit_the_cache() {
        let mut camera = Camera::default();
        camera.translate([1.0, 2.0, 3.0]);
        let first = camera.world_to_view().unwrap();
        for _ in 0..10 {
            assert_eq!(camera.world_to_view().unwrap(), first);
        }
        assert_eq!(camera.view_recomputations(), 1);
    }

    #[test]
    fn mutation_invalidates_the_cache() {
        let mut camera = Camera::default();
        let before = camera.world_to_view().unwrap();
        camera.rotate_y(0.25);
        let after = camera.world_to_view().unwrap();
        assert_ne!(before, after);
        assert_eq!(camera.view_recomputations(), 2);
        assert!((*camera.transform() * after).abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn skybox_view_has_no_translation() {
        let mut camera = Camera::default();
        camera.translate([4.0, -1.0, 7.0]);
        camera.rotate_x(0.3);
        let skybox = camera.skybox_world_to_view().unwrap();
        let full = camera.world_to_view().unwrap();
        assert_eq!(math::translation_of(skybox), Vec3::ZERO);
        assert_eq!(skybox.x_axis, full.x_axis);
        assert_eq!(skybox.y_axis, full.y_axis);
        assert_eq!(skybox.z_axis, full.z_axis);
        assert_eq!(camera.view_recomputations(), 1);
    }

    #[test]
    fn set_orientation_preserves_position() {
        let mut camera = Camera::default();
        camera.set_position([0.0, 0.0, 2.0]);
        camera.set_orientation(FRAC_PI_2, 0.0);
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 2.0));
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_X, 1e-6));
        assert_eq!(camera.yaw(), FRAC_PI_2);
    }

    #[test]
    fn sync_orientation_recovers_local_rotations() {
        let mut camera = Camera::default();
        camera.set_position([0.0, 5.0, 0.0]);
        assert!(!camera.sync_orientation());

        camera.rotate_y(0.8);
        camera.rotate_x(-std::f32::consts::FRAC_PI_4);
        let before = *camera.transform();
        assert!(camera.sync_orientation());
        assert!((camera.yaw() - 0.8).abs() < 1e-5);
        assert!((camera.pitch() + std::f32::consts::FRAC_PI_4).abs() < 1e-5);
        assert_eq!(*camera.transform(), before);

        camera.set_orientation(camera.yaw(), camera.pitch());
        assert!(camera.transform().abs_diff_eq(before, 1e-5));
        assert!(!camera.sync_orientation());
    }

    #[test]
    fn sync_orientation_keeps_heading_when_looking_straight_down() {
        let mut camera = Camera::default();
        camera.rotate_y(-1.1);
        camera.rotate_x(-FRAC_PI_2);
        assert!(camera.sync_orientation());
        assert!((camera.yaw() + 1.1).abs() < 1e-5);
        assert!((camera.pitch() + FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn set_aspect_recomputes_projection() {
        let mut camera = Camera::default();
        let square = camera.projection();
        camera.set_aspect(2.0);
        assert_ne!(square, camera.projection());
        assert_eq!(camera.params().aspect, 2.0);
        assert_eq!(camera.projection(), ProjectionParams::default().aspect(2.0).matrix());
    }

    #[test]
    fn validate_rejects_degenerate_parameters() {
        assert!(ProjectionParams::default().validate().is_ok());
        assert!(ProjectionParams::default().fov(0.0).validate().is_err());
        assert!(ProjectionParams::default().fov(std::f32::consts::PI).validate().is_err());
        assert!(ProjectionParams::default().aspect(0.0).validate().is_err());
        assert!(ProjectionParams::default().clip_planes(1.0, 1.0).validate().is_err());
        assert!(ProjectionParams::default().clip_planes(0.0, 10.0).validate().is_err());
        assert!(matches!(
            ProjectionParams::default().aspect(f32::NAN).validate(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn singular_transform_surfaces_as_error() {
        let mut camera = Camera::default();
        *camera.transform_mut() = Mat4::ZERO;
        assert!(matches!(camera.world_to_view(), Err(Error::Singular(_))));
        assert_eq!(camera.view_recomputations(), 0);
    }
}
