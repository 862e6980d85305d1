//! Camera controllers: input snapshot in, camera motion out.
//!
//! Two navigation models share the same movement keys and differ in how mouse
//! motion turns into rotation:
//!
//! - [`EulerController`] keeps yaw and pitch as scalars and rebuilds the
//!   rotation from them each tick. Nothing accumulates, so it stays exact over
//!   long sessions. This is the default.
//! - [`IncrementalController`] composes a small rotation onto the current
//!   transform each tick. Cheap and stateless, but rounding error builds up.
//!
//! # Controls
//!
//! - **W/S**: Move forward/backward
//! - **A/D**: Strafe left/right
//! - **Space**: Move up
//! - **Left Shift**: Move down
//! - **Mouse** (while the look button is held): Look around
//!
//! # Example
//!
//! ```
//! use vantage::{
//!     Camera, CameraController, ControllerConfig, Entity, InputSnapshot, KeyCode, NavigationModel,
//! };
//!
//! let mut camera = Camera::default();
//! let mut controller = ControllerConfig::default()
//!     .model(NavigationModel::Euler)
//!     .speed(2.0)
//!     .build();
//!
//! let input = InputSnapshot::idle().with_key(KeyCode::KeyW);
//! controller.control(&mut camera, 0.5, &input).unwrap();
//! assert_eq!(camera.position().z, -1.0);
//! ```

mod euler;
mod incremental;

pub use euler::EulerController;
pub use incremental::IncrementalController;

use std::str::FromStr;

use glam::Vec3;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::input::InputSnapshot;
use crate::scene::{UpdateContext, Updatable};
use crate::transform::Translatable;

/// Moves a camera in response to one tick of input.
pub trait CameraController {
    fn control(&mut self, camera: &mut Camera, dt: f32, input: &InputSnapshot) -> Result<()>;
}

impl Updatable for Box<dyn CameraController> {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<()> {
        self.control(ctx.camera, ctx.dt, ctx.input)
    }
}

/// Which rotation strategy a controller uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavigationModel {
    /// Persistent yaw/pitch, rotation rebuilt each tick.
    #[default]
    Euler,
    /// Per-tick rotation composed onto the current transform.
    Incremental,
}

impl FromStr for NavigationModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "euler" => Ok(Self::Euler),
            "incremental" => Ok(Self::Incremental),
            other => Err(Error::Config(format!(
                "unknown navigation model '{other}' (expected 'euler' or 'incremental')"
            ))),
        }
    }
}

/// Controller settings shared by both navigation models.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerConfig {
    pub model: NavigationModel,
    /// Movement speed in units per second.
    pub speed: f32,
    /// Radians of rotation per pixel of mouse movement.
    pub sensitivity: f32,
    /// Button that must be held to look around. `None` looks on any motion.
    pub look_button: Option<MouseButton>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            model: NavigationModel::Euler,
            speed: 1.0,
            sensitivity: 0.005,
            look_button: Some(MouseButton::Left),
        }
    }
}

impl ControllerConfig {
    pub fn model(mut self, model: NavigationModel) -> Self {
        self.model = model;
        self
    }

    /// Set movement speed in units per second.
    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set mouse sensitivity in radians per pixel.
    pub fn sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn look_button(mut self, button: Option<MouseButton>) -> Self {
        self.look_button = button;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.speed >= 0.0 && self.speed.is_finite()) {
            return Err(Error::Config(format!(
                "movement speed {} must be finite and non-negative",
                self.speed
            )));
        }
        if !self.sensitivity.is_finite() {
            return Err(Error::Config("mouse sensitivity must be finite".into()));
        }
        Ok(())
    }

    /// Builds the controller this configuration describes.
    pub fn build(&self) -> Box<dyn CameraController> {
        match self.model {
            NavigationModel::Euler => Box::new(EulerController::new(*self)),
            NavigationModel::Incremental => Box::new(IncrementalController::new(*self)),
        }
    }

    /// Mouse movement to apply this tick, or `None` if the camera should not turn.
    fn look_delta(&self, input: &InputSnapshot) -> Option<glam::Vec2> {
        let held = match self.look_button {
            Some(button) => input.mouse_held(button),
            None => true,
        };
        let movement = input.mouse.movement;
        (held && movement != glam::Vec2::ZERO).then_some(movement)
    }
}

/// Local-space direction requested by the movement keys, unnormalized.
fn movement_direction(input: &InputSnapshot) -> Vec3 {
    const BINDINGS: [(KeyCode, Vec3); 6] = [
        (KeyCode::KeyW, Vec3::NEG_Z),
        (KeyCode::KeyS, Vec3::Z),
        (KeyCode::KeyA, Vec3::NEG_X),
        (KeyCode::KeyD, Vec3::X),
        (KeyCode::Space, Vec3::Y),
        (KeyCode::ShiftLeft, Vec3::NEG_Y),
    ];

    BINDINGS
        .iter()
        .filter(|(key, _)| input.key(*key))
        .map(|(_, dir)| *dir)
        .sum()
}

/// Translates the camera along its local axes. Writes nothing when there is
/// no net movement, so an idle tick leaves the transform untouched.
fn apply_movement(camera: &mut Camera, input: &InputSnapshot, speed: f32, dt: f32) {
    let direction = movement_direction(input);
    if direction.length_squared() == 0.0 {
        return;
    }
    let delta = direction.normalize() * speed * dt;
    if delta != Vec3::ZERO {
        camera.translate(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Entity;

    #[test]
    fn model_parses_from_argument() {
        assert_eq!("euler".parse::<NavigationModel>().unwrap(), NavigationModel::Euler);
        assert_eq!(
            "Incremental".parse::<NavigationModel>().unwrap(),
            NavigationModel::Incremental
        );
        assert!(matches!(
            "orbit".parse::<NavigationModel>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut camera = Camera::default();
        let input = InputSnapshot::idle()
            .with_key(KeyCode::KeyW)
            .with_key(KeyCode::KeyS);
        let before = *camera.transform();
        apply_movement(&mut camera, &input, 1.0, 0.016);
        assert_eq!(*camera.transform(), before);
    }

    #[test]
    fn each_key_moves_along_its_local_axis() {
        let cases = [
            (KeyCode::KeyW, Vec3::NEG_Z),
            (KeyCode::KeyS, Vec3::Z),
            (KeyCode::KeyA, Vec3::NEG_X),
            (KeyCode::KeyD, Vec3::X),
            (KeyCode::Space, Vec3::Y),
            (KeyCode::ShiftLeft, Vec3::NEG_Y),
        ];
        for (key, expected) in cases {
            let mut camera = Camera::default();
            apply_movement(&mut camera, &InputSnapshot::idle().with_key(key), 2.0, 0.5);
            assert_eq!(camera.position(), expected, "{key:?}");
        }
    }

    #[test]
    fn diagonal_movement_is_not_faster() {
        let mut camera = Camera::default();
        let input = InputSnapshot::idle()
            .with_key(KeyCode::KeyW)
            .with_key(KeyCode::KeyD);
        apply_movement(&mut camera, &input, 1.0, 1.0);
        assert!((camera.position().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn look_requires_button_unless_disabled() {
        let config = ControllerConfig::default();
        let moving = InputSnapshot::idle().with_movement(3.0, 0.0);
        assert_eq!(config.look_delta(&moving), None);
        assert!(
            config
                .look_delta(&moving.clone().with_button(MouseButton::Left))
                .is_some()
        );
        assert_eq!(
            config.look_delta(&moving.clone().with_button(MouseButton::Right)),
            None
        );

        let always = config.look_button(None);
        assert!(always.look_delta(&moving).is_some());
        assert_eq!(always.look_delta(&InputSnapshot::idle()), None);
    }

    #[test]
    fn validate_rejects_bad_speed() {
        assert!(ControllerConfig::default().validate().is_ok());
        assert!(ControllerConfig::default().speed(-1.0).validate().is_err());
        assert!(ControllerConfig::default().speed(f32::INFINITY).validate().is_err());
        assert!(ControllerConfig::default().sensitivity(f32::NAN).validate().is_err());
    }
}
