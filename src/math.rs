//! Matrix and vector operations used by every transform in the crate.
//!
//! All matrices are column-major [`Mat4`]s acting on column vectors, so a
//! transform `m` followed by a local operation `t` is `m * t`. The `translate`,
//! `rotate_*` and `scale` helpers below all post-multiply, which means they act
//! in the *local* frame of `m`. Translation lives in the fourth column, i.e.
//! elements `12..15` of [`Mat4::to_cols_array`].
//!
//! # Example
//!
//! ```
//! use vantage::math;
//! use vantage::{Mat4, Vec3};
//!
//! let m = math::translate(Mat4::IDENTITY, Vec3::new(0.0, 0.0, 1.0));
//! let inv = math::invert(m).unwrap();
//! assert!(math::multiply(m, inv).abs_diff_eq(Mat4::IDENTITY, 1e-6));
//! ```

use glam::{Mat3, Mat4, Vec3};

/// Determinants at or below this magnitude are treated as zero.
pub const SINGULAR_EPSILON: f32 = 1e-12;

/// Returned by [`invert`] when the matrix has no inverse.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
#[error("determinant {determinant} is indistinguishable from zero")]
pub struct SingularMatrix {
    /// The offending determinant.
    pub determinant: f32,
}

/// Returns `a · b`.
#[inline]
pub fn multiply(a: Mat4, b: Mat4) -> Mat4 {
    a * b
}

pub fn determinant(m: Mat4) -> f32 {
    m.determinant()
}

/// Inverts `m` via the adjugate, failing if `m` is singular.
///
/// Rigid and affine transforms with non-zero scale are always invertible; for
/// those callers a failure is a programming error and should be propagated as
/// fatal.
pub fn invert(m: Mat4) -> Result<Mat4, SingularMatrix> {
    let determinant = m.determinant();
    if !determinant.is_finite() || determinant.abs() <= SINGULAR_EPSILON {
        return Err(SingularMatrix { determinant });
    }
    Ok(m.inverse())
}

/// Right-handed perspective projection with a `[0, 1]` depth range.
///
/// `fov_x` is the horizontal field of view in radians. The caller must ensure
/// `0 < fov_x < π`, `aspect > 0` and `0 < near < far`; nothing is checked in
/// release builds.
pub fn perspective(fov_x: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    debug_assert!(fov_x > 0.0 && fov_x < std::f32::consts::PI, "fov out of range");
    debug_assert!(aspect > 0.0, "aspect must be positive");
    debug_assert!(near > 0.0 && far > near, "clip planes must satisfy 0 < near < far");
    Mat4::perspective_rh(horizontal_to_vertical_fov(fov_x, aspect), aspect, near, far)
}

/// Converts a horizontal field of view to the vertical one for `aspect`.
pub fn horizontal_to_vertical_fov(fov_x: f32, aspect: f32) -> f32 {
    2.0 * ((fov_x * 0.5).tan() / aspect).atan()
}

/// Right-handed orthographic projection spanning `[-width, width]`
/// horizontally and `[-width / aspect, width / aspect]` vertically.
pub fn orthographic(width: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let height = width / aspect;
    Mat4::orthographic_rh(-width, width, -height, height, near, far)
}

pub fn translation(d: Vec3) -> Mat4 {
    Mat4::from_translation(d)
}

pub fn scaling(s: Vec3) -> Mat4 {
    Mat4::from_scale(s)
}

pub fn rotation_x(radians: f32) -> Mat4 {
    Mat4::from_rotation_x(radians)
}

pub fn rotation_y(radians: f32) -> Mat4 {
    Mat4::from_rotation_y(radians)
}

pub fn rotation_z(radians: f32) -> Mat4 {
    Mat4::from_rotation_z(radians)
}

/// Rotation about an arbitrary axis. The axis is normalized here; a zero
/// axis has no defined rotation and must not be passed.
pub fn rotation_axis(radians: f32, axis: Vec3) -> Mat4 {
    debug_assert!(axis.length_squared() > 0.0, "rotation axis must be non-zero");
    Mat4::from_axis_angle(axis.normalize(), radians)
}

pub fn translate(m: Mat4, d: Vec3) -> Mat4 {
    multiply(m, translation(d))
}

/// Post-multiplies a scale. Zero components are allowed and flatten that axis.
pub fn scale(m: Mat4, s: Vec3) -> Mat4 {
    multiply(m, scaling(s))
}

pub fn rotate_x(m: Mat4, radians: f32) -> Mat4 {
    multiply(m, rotation_x(radians))
}

pub fn rotate_y(m: Mat4, radians: f32) -> Mat4 {
    multiply(m, rotation_y(radians))
}

pub fn rotate_z(m: Mat4, radians: f32) -> Mat4 {
    multiply(m, rotation_z(radians))
}

pub fn rotate_axis(m: Mat4, radians: f32, axis: Vec3) -> Mat4 {
    multiply(m, rotation_axis(radians, axis))
}

/// Transforms a point (w = 1) by `m`.
pub fn transform_point(m: Mat4, p: Vec3) -> Vec3 {
    m.transform_point3(p)
}

/// Returns the translation column of `m`.
pub fn translation_of(m: Mat4) -> Vec3 {
    m.w_axis.truncate()
}

/// Returns `m` with its translation column reset to the origin.
pub fn without_translation(mut m: Mat4) -> Mat4 {
    m.w_axis = glam::Vec4::W;
    m
}

/// Whether the upper 3×3 block of `m` is a proper rotation within `eps`.
pub fn is_orthonormal(m: Mat4, eps: f32) -> bool {
    let r = Mat3::from_mat4(m);
    let gram = r.transpose() * r;
    gram.abs_diff_eq(Mat3::IDENTITY, eps) && (r.determinant() - 1.0).abs() <= eps
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    /// Small deterministic generator so rigid-transform sweeps are reproducible.
    struct XorShift(u32);

    impl XorShift {
        fn next_f32(&mut self) -> f32 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 17;
            self.0 ^= self.0 << 5;
            self.0 as f32 / u32::MAX as f32
        }

        fn range(&mut self, lo: f32, hi: f32) -> f32 {
            lo + (hi - lo) * self.next_f32()
        }
    }

    fn random_rigid(rng: &mut XorShift) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        for _ in 0..3 {
            m = translate(
                m,
                Vec3::new(rng.range(-5.0, 5.0), rng.range(-5.0, 5.0), rng.range(-5.0, 5.0)),
            );
            m = rotate_x(m, rng.range(-PI, PI));
            m = rotate_y(m, rng.range(-PI, PI));
            m = rotate_z(m, rng.range(-PI, PI));
            let axis = Vec3::new(rng.range(0.1, 1.0), rng.range(-1.0, 1.0), rng.range(-1.0, 1.0));
            m = rotate_axis(m, rng.range(-PI, PI), axis);
        }
        m
    }

    #[test]
    fn inverse_of_rigid_transforms_is_exact_enough() {
        let mut rng = XorShift(0x9E37_79B9);
        for _ in 0..200 {
            let t = random_rigid(&mut rng);
            let inv = invert(t).unwrap();
            assert!(multiply(t, inv).abs_diff_eq(Mat4::IDENTITY, 1e-4));
            assert!(is_orthonormal(t, 1e-4));
        }
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let flat = scale(Mat4::IDENTITY, Vec3::new(1.0, 0.0, 1.0));
        let err = invert(flat).unwrap_err();
        assert_eq!(err.determinant, 0.0);
        assert!(invert(Mat4::ZERO).is_err());
        assert!(invert(Mat4::from_cols_array(&[f32::NAN; 16])).is_err());
    }

    #[test]
    fn translate_is_local() {
        // Rotated a quarter turn about Y, local +Z points toward world +X.
        let m = rotate_y(Mat4::IDENTITY, FRAC_PI_2);
        let moved = translate(m, Vec3::Z);
        assert!(translation_of(moved).abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn multiply_is_not_commutative() {
        let r = rotation_z(FRAC_PI_2);
        let t = translation(Vec3::X);
        let rt = transform_point(multiply(r, t), Vec3::ZERO);
        let tr = transform_point(multiply(t, r), Vec3::ZERO);
        assert!(rt.abs_diff_eq(Vec3::Y, 1e-6));
        assert!(tr.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn rotations_follow_right_hand_rule() {
        assert!(transform_point(rotation_x(FRAC_PI_2), Vec3::Y).abs_diff_eq(Vec3::Z, 1e-6));
        assert!(transform_point(rotation_y(FRAC_PI_2), Vec3::Z).abs_diff_eq(Vec3::X, 1e-6));
        assert!(transform_point(rotation_z(FRAC_PI_2), Vec3::X).abs_diff_eq(Vec3::Y, 1e-6));
        let about_y = rotation_axis(FRAC_PI_2, Vec3::new(0.0, 3.0, 0.0));
        assert!(about_y.abs_diff_eq(rotation_y(FRAC_PI_2), 1e-6));
    }

    #[test]
    fn perspective_uses_horizontal_fov() {
        // With a square viewport the horizontal and vertical fov coincide.
        let square = perspective(FRAC_PI_2, 1.0, 0.1, 100.0);
        assert!((square.x_axis.x - 1.0).abs() < 1e-6);
        assert!((square.y_axis.y - 1.0).abs() < 1e-6);

        // A wide viewport keeps the horizontal scale fixed.
        let wide = perspective(FRAC_PI_2, 2.0, 0.1, 100.0);
        assert!((wide.x_axis.x - 1.0).abs() < 1e-6);
        assert!((wide.y_axis.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth() {
        let p = perspective(FRAC_PI_2, 1.0, 0.1, 100.0);
        let near = p.project_point3(Vec3::new(0.0, 0.0, -0.1));
        let far = p.project_point3(Vec3::new(0.0, 0.0, -100.0));
        assert!(near.z.abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn orthographic_spans_width() {
        let o = orthographic(2.0, 2.0, 0.1, 10.0);
        let edge = o.project_point3(Vec3::new(2.0, 1.0, -1.0));
        assert!((edge.x - 1.0).abs() < 1e-6);
        assert!((edge.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_scale_is_allowed() {
        let flat = scale(Mat4::IDENTITY, Vec3::new(2.0, 0.0, 2.0));
        assert_eq!(transform_point(flat, Vec3::ONE), Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn without_translation_keeps_rotation() {
        let m = translate(rotation_y(0.3), Vec3::new(1.0, 2.0, 3.0));
        let r = without_translation(m);
        assert_eq!(translation_of(r), Vec3::ZERO);
        assert_eq!(Mat3::from_mat4(r), Mat3::from_mat4(m));
    }
}
