use glam::Vec3;

use crate::camera::Camera;
use crate::error::Result;
use crate::input::InputSnapshot;
use crate::scene::{UpdateContext, Updatable};
use crate::transform::Rotatable;

use super::{CameraController, ControllerConfig, apply_movement};

/// Controller that turns the camera by composing small rotations onto its
/// current transform: pitch about the local right axis, yaw about world up.
///
/// Holds no orientation state of its own, which also means the camera's
/// `yaw()`/`pitch()` fields are left alone.
#[derive(Clone, Debug)]
pub struct IncrementalController {
    config: ControllerConfig,
}

impl IncrementalController {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

impl Default for IncrementalController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl CameraController for IncrementalController {
    fn control(&mut self, camera: &mut Camera, dt: f32, input: &InputSnapshot) -> Result<()> {
        if let Some(delta) = self.config.look_delta(input) {
            if delta.y != 0.0 {
                camera.rotate_x(-delta.y * self.config.sensitivity);
            }
            if delta.x != 0.0 {
                // World up, so the horizon never rolls.
                camera.rotate_world(-delta.x * self.config.sensitivity, Vec3::Y);
            }
        }

        apply_movement(camera, input, self.config.speed, dt);
        Ok(())
    }
}

impl Updatable for IncrementalController {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<()> {
        self.control(ctx.camera, ctx.dt, ctx.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math;
    use crate::transform::{Entity, Translatable};
    use winit::event::MouseButton;

    fn drag(dx: f32, dy: f32) -> InputSnapshot {
        InputSnapshot::idle()
            .with_movement(dx, dy)
            .with_button(MouseButton::Left)
    }

    #[test]
    fn no_rotation_without_look_button() {
        let mut camera = Camera::default();
        let mut controller = IncrementalController::default();
        let input = InputSnapshot::idle().with_movement(40.0, -12.0);
        controller.control(&mut camera, 0.016, &input).unwrap();
        assert_eq!(*camera.transform(), glam::Mat4::IDENTITY);
    }

    #[test]
    fn yaw_pivots_around_camera_position() {
        let mut camera = Camera::default();
        camera.translate([2.0, 0.5, -3.0]);
        let mut controller = IncrementalController::default();
        controller.control(&mut camera, 0.016, &drag(60.0, 25.0)).unwrap();

        assert_eq!(camera.position(), Vec3::new(2.0, 0.5, -3.0));
        assert!(math::is_orthonormal(*camera.transform(), 1e-5));
        // Right stays horizontal because yaw is applied about world up.
        assert!(camera.right().y.abs() < 1e-6);
    }

    #[test]
    fn drag_directions() {
        let mut controller = IncrementalController::default();

        let mut camera = Camera::default();
        controller.control(&mut camera, 0.016, &drag(50.0, 0.0)).unwrap();
        assert!(camera.forward().x > 0.0, "dragging right turns right");

        let mut camera = Camera::default();
        controller.control(&mut camera, 0.016, &drag(0.0, 50.0)).unwrap();
        assert!(camera.forward().y < 0.0, "dragging down looks down");
    }

    #[test]
    fn orientation_fields_are_untouched() {
        let mut camera = Camera::default();
        let mut controller = IncrementalController::default();
        controller.control(&mut camera, 0.016, &drag(10.0, 10.0)).unwrap();
        assert_eq!(camera.yaw(), 0.0);
        assert_eq!(camera.pitch(), 0.0);
    }
}
