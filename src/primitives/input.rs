use cgmath::Vector2;
use winit::event::*;

/// Keyboard and mouse state for a single frame, handed to whoever needs it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub mouse_delta: Vector2<f32>,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            up: false,
            down: false,
            left: false,
            right: false,
            mouse_delta: Vector2::new(0.0, 0.0),
        }
    }
}

/// Folds window and device events between frames.
#[derive(Debug, Default)]
pub struct InputState {
    current: InputSnapshot,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state,
                        virtual_keycode: Some(keycode),
                        ..
                    },
                ..
            } => self.set_key(*keycode, *state == ElementState::Pressed),
            _ => false,
        }
    }

    pub fn set_key(&mut self, keycode: VirtualKeyCode, is_pressed: bool) -> bool {
        match keycode {
            VirtualKeyCode::W | VirtualKeyCode::Up => {
                self.current.up = is_pressed;
                true
            }
            VirtualKeyCode::S | VirtualKeyCode::Down => {
                self.current.down = is_pressed;
                true
            }
            VirtualKeyCode::A | VirtualKeyCode::Left => {
                self.current.left = is_pressed;
                true
            }
            VirtualKeyCode::D | VirtualKeyCode::Right => {
                self.current.right = is_pressed;
                true
            }
            _ => false,
        }
    }

    pub fn process_mouse_motion(&mut self, (dx, dy): (f64, f64)) {
        self.current.mouse_delta += Vector2::new(dx as f32, dy as f32);
    }

    /// Returns the state for this frame; mouse motion restarts from zero while keys stay held.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let snapshot = self.current;
        self.current.mouse_delta = Vector2::new(0.0, 0.0);
        snapshot
    }
}
