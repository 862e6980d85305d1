use std::collections::HashSet;

use glam::Vec2;
use winit::event::{DeviceEvent, ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Mouse state captured for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MouseSnapshot {
    /// Whether any button is held.
    pub pressed: bool,
    /// The most recently pressed button that is still held.
    pub button: Option<MouseButton>,
    /// Movement since the previous tick, in pixels. +x is right, +y is down.
    pub movement: Vec2,
}

/// Immutable input record handed to controllers each tick.
///
/// Keys absent from `keys` are simply not held; there is no separate
/// "unknown key" state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    pub mouse: MouseSnapshot,
    pub keys: HashSet<KeyCode>,
}

impl InputSnapshot {
    /// A snapshot with nothing held and no movement.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: KeyCode) -> Self {
        self.keys.insert(key);
        self
    }

    pub fn with_movement(mut self, dx: f32, dy: f32) -> Self {
        self.mouse.movement = Vec2::new(dx, dy);
        self
    }

    /// Marks `button` as the held button.
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.mouse.pressed = true;
        self.mouse.button = Some(button);
        self
    }

    /// Returns true if the key is held.
    pub fn key(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// Returns true if `button` is the held button.
    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse.pressed && self.mouse.button == Some(button)
    }

    /// Returns true if nothing is held and the mouse did not move.
    pub fn is_idle(&self) -> bool {
        !self.mouse.pressed && self.mouse.movement == Vec2::ZERO && self.keys.is_empty()
    }
}

/// Collects winit events between ticks and produces [`InputSnapshot`]s.
#[derive(Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    mouse_buttons_down: Vec<MouseButton>,
    mouse_position: Option<Vec2>,
    cursor_delta: Vec2,
    raw_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the start of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.cursor_delta = Vec2::ZERO;
        self.raw_delta = Vec2::ZERO;
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            self.keys_down.insert(key);
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_buttons_down.retain(|b| b != button);
                if *state == ElementState::Pressed {
                    self.mouse_buttons_down.push(*button);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                // The first position after entering the window carries no motion.
                if let Some(old_pos) = self.mouse_position {
                    self.cursor_delta += new_pos - old_pos;
                }
                self.mouse_position = Some(new_pos);
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_position = None;
            }
            WindowEvent::Focused(false) => {
                // Releases are not delivered while unfocused.
                self.keys_down.clear();
                self.mouse_buttons_down.clear();
            }
            _ => {}
        }
    }

    /// Process raw device motion. When present it takes precedence over
    /// cursor deltas, since it keeps reporting at the window edge.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.raw_delta += Vec2::new(delta.0 as f32, delta.1 as f32);
        }
    }

    /// Mouse movement delta this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        if self.raw_delta != Vec2::ZERO {
            self.raw_delta
        } else {
            self.cursor_delta
        }
    }

    /// Freezes the current state into a snapshot for this tick.
    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            mouse: MouseSnapshot {
                pressed: !self.mouse_buttons_down.is_empty(),
                button: self.mouse_buttons_down.last().copied(),
                movement: self.mouse_delta(),
            },
            keys: self.keys_down.clone(),
        }
    }
}
