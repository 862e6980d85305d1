use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::camera::Camera;
use crate::error::Result;
use crate::input::InputSnapshot;
use crate::scene::{UpdateContext, Updatable};

use super::{CameraController, ControllerConfig, apply_movement};

/// First-person controller that stores yaw and pitch on the camera and
/// rebuilds the rotation from them every time the mouse moves.
///
/// An orientation set some other way (`rotate_x`, or a previous
/// [`IncrementalController`](super::IncrementalController)) is read back into
/// yaw and pitch first, so taking over a camera does not snap its view.
///
/// Pitch is clamped to `[-π/2, π/2]`, so looking straight up or down is
/// allowed but never past it. Yaw wraps into `(-π, π]`.
#[derive(Clone, Debug)]
pub struct EulerController {
    config: ControllerConfig,
}

impl EulerController {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

impl Default for EulerController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl CameraController for EulerController {
    fn control(&mut self, camera: &mut Camera, dt: f32, input: &InputSnapshot) -> Result<()> {
        if let Some(delta) = self.config.look_delta(input) {
            // Pick up rotations made outside this controller before building on the angles.
            camera.sync_orientation();
            let yaw = wrap_angle(camera.yaw() - delta.x * self.config.sensitivity);
            let pitch =
                (camera.pitch() - delta.y * self.config.sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
            camera.set_orientation(yaw, pitch);
        }

        apply_movement(camera, input, self.config.speed, dt);
        Ok(())
    }
}

impl Updatable for EulerController {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<()> {
        self.control(ctx.camera, ctx.dt, ctx.input)
    }
}

/// Wraps an angle into `(-π, π]`.
pub(crate) fn wrap_angle(radians: f32) -> f32 {
    let r = radians.rem_euclid(TAU);
    if r > PI { r - TAU } else { r }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Entity, Rotatable};
    use glam::{Mat4, Vec3};
    use winit::event::MouseButton;
    use winit::keyboard::KeyCode;

    fn look(dx: f32, dy: f32) -> InputSnapshot {
        InputSnapshot::idle()
            .with_movement(dx, dy)
            .with_button(MouseButton::Left)
    }

    #[test]
    fn wrap_angle_range() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert_eq!(wrap_angle(PI), PI);
        assert_eq!(wrap_angle(-PI), PI);
        assert!((wrap_angle(PI + 0.5) - (-PI + 0.5)).abs() < 1e-5);
        assert!((wrap_angle(-PI - 0.5) - (PI - 0.5)).abs() < 1e-5);
        assert!((wrap_angle(5.0 * TAU + 1.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn yaw_wraps_past_pi() {
        let mut camera = Camera::default();
        let mut controller = EulerController::new(ControllerConfig::default().sensitivity(0.01));
        // Each step turns 0.5 rad to the left; 8 steps make 4 rad.
        for _ in 0..8 {
            controller.control(&mut camera, 0.016, &look(-50.0, 0.0)).unwrap();
            assert!(camera.yaw() > -PI && camera.yaw() <= PI);
        }
        assert!((camera.yaw() - (4.0 - TAU)).abs() < 1e-4);
        assert!(math_is_rigid(&camera));
    }

    #[test]
    fn pitch_clamps_exactly() {
        let mut camera = Camera::default();
        let mut controller = EulerController::default();
        for _ in 0..20 {
            controller.control(&mut camera, 0.016, &look(0.0, -200.0)).unwrap();
        }
        assert_eq!(camera.pitch(), FRAC_PI_2);
        assert!(camera.forward().abs_diff_eq(Vec3::Y, 1e-6));

        for _ in 0..40 {
            controller.control(&mut camera, 0.016, &look(0.0, 200.0)).unwrap();
        }
        assert_eq!(camera.pitch(), -FRAC_PI_2);
    }

    #[test]
    fn mouse_right_turns_right() {
        let mut camera = Camera::default();
        let mut controller = EulerController::default();
        controller.control(&mut camera, 0.016, &look(100.0, 0.0)).unwrap();
        assert!(camera.yaw() < 0.0);
        assert!(camera.forward().x > 0.0);
    }

    #[test]
    fn idle_tick_writes_nothing() {
        let mut camera = Camera::default();
        camera.set_orientation(0.3, -0.2);
        camera.set_position([1.0, 2.0, 3.0]);
        let _ = camera.world_to_view().unwrap();
        let before = *camera.transform();

        let mut controller = EulerController::default();
        controller.control(&mut camera, 0.0, &InputSnapshot::idle()).unwrap();
        controller.control(&mut camera, 0.016, &InputSnapshot::idle()).unwrap();

        assert_eq!(*camera.transform(), before);
        let _ = camera.world_to_view().unwrap();
        assert_eq!(camera.view_recomputations(), 1);
    }

    #[test]
    fn movement_follows_heading() {
        let mut camera = Camera::default();
        camera.set_orientation(FRAC_PI_2, 0.0);
        let mut controller = EulerController::default();
        let input = InputSnapshot::idle().with_key(KeyCode::KeyW);
        controller.control(&mut camera, 1.0, &input).unwrap();
        assert!(camera.position().abs_diff_eq(Vec3::NEG_X, 1e-6));
    }

    #[test]
    fn existing_tilt_survives_the_first_look() {
        let mut camera = Camera::default();
        camera.rotate_x(-std::f32::consts::FRAC_PI_4);
        let mut controller = EulerController::default();
        controller.control(&mut camera, 0.016, &look(1.0, 0.0)).unwrap();

        assert!((camera.pitch() + std::f32::consts::FRAC_PI_4).abs() < 1e-5);
        assert!((camera.forward().y + std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
        assert!((camera.yaw() + 0.005).abs() < 1e-5);
    }

    fn math_is_rigid(camera: &Camera) -> bool {
        crate::math::is_orthonormal(*camera.transform(), 1e-5)
            && camera.transform().w_axis == Mat4::IDENTITY.w_axis
    }
}
