//! Input aggregation
//!
//! Keyboard, pointer and multi-touch events all land in one `InputState`.
//! Event handlers only mutate this state; the game loop reads a `TickInput`
//! snapshot once per frame.

use glam::Vec2;

use crate::sim::{Aim, TickInput};
use crate::unit_or_zero;

/// Stick vectors shorter than this produce no input
pub const JOYSTICK_DEADZONE: f32 = 10.0;
/// Distance of each stick's fixed center from its bottom corner
pub const JOYSTICK_MARGIN: f32 = 100.0;

/// Logical controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

impl Control {
    /// Map a browser `KeyboardEvent.key` value to a control
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" | "W" | "ArrowUp" => Some(Control::Up),
            "s" | "S" | "ArrowDown" => Some(Control::Down),
            "a" | "A" | "ArrowLeft" => Some(Control::Left),
            "d" | "D" | "ArrowRight" => Some(Control::Right),
            " " | "Spacebar" => Some(Control::Fire),
            _ => None,
        }
    }
}

/// A touch bound to a virtual joystick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchStick {
    pub touch_id: i32,
    pub pos: Vec2,
}

/// Shared input state
#[derive(Debug, Clone, Default)]
pub struct InputState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    fire_key: bool,
    pointer_down: bool,
    pointer: Option<Vec2>,
    viewport: Vec2,
    move_touch: Option<TouchStick>,
    aim_touch: Option<TouchStick>,
}

impl InputState {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    fn set_control(&mut self, control: Control, held: bool) {
        match control {
            Control::Up => self.up = held,
            Control::Down => self.down = held,
            Control::Left => self.left = held,
            Control::Right => self.right = held,
            Control::Fire => self.fire_key = held,
        }
    }

    /// Returns true if the key maps to a control
    pub fn key_down(&mut self, key: &str) -> bool {
        match Control::from_key(key) {
            Some(c) => {
                self.set_control(c, true);
                true
            }
            None => false,
        }
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        match Control::from_key(key) {
            Some(c) => {
                self.set_control(c, false);
                true
            }
            None => false,
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
    }

    pub fn pointer_down(&mut self) {
        self.pointer_down = true;
    }

    pub fn pointer_up(&mut self) {
        self.pointer_down = false;
    }

    /// Fixed center of the movement stick
    pub fn move_center(&self) -> Vec2 {
        Vec2::new(JOYSTICK_MARGIN, self.viewport.y - JOYSTICK_MARGIN)
    }

    /// Fixed center of the aim stick
    pub fn aim_center(&self) -> Vec2 {
        Vec2::new(
            self.viewport.x - JOYSTICK_MARGIN,
            self.viewport.y - JOYSTICK_MARGIN,
        )
    }

    /// Bind a new touch to the stick for its screen half, if that stick is free
    pub fn touch_start(&mut self, touch_id: i32, pos: Vec2) {
        let stick = TouchStick { touch_id, pos };
        let slot = if pos.x < self.viewport.x * 0.5 {
            &mut self.move_touch
        } else {
            &mut self.aim_touch
        };
        if slot.is_none() {
            *slot = Some(stick);
        }
    }

    pub fn touch_move(&mut self, touch_id: i32, pos: Vec2) {
        for stick in [&mut self.move_touch, &mut self.aim_touch]
            .into_iter()
            .flatten()
        {
            if stick.touch_id == touch_id {
                stick.pos = pos;
            }
        }
    }

    pub fn touch_end(&mut self, touch_id: i32) {
        if self.move_touch.is_some_and(|s| s.touch_id == touch_id) {
            self.move_touch = None;
        }
        if self.aim_touch.is_some_and(|s| s.touch_id == touch_id) {
            self.aim_touch = None;
        }
    }

    /// Release everything (blur, unmount)
    pub fn clear(&mut self) {
        let viewport = self.viewport;
        let pointer = self.pointer;
        *self = Self {
            viewport,
            pointer,
            ..Default::default()
        };
    }

    pub fn move_touch(&self) -> Option<TouchStick> {
        self.move_touch
    }

    pub fn aim_touch(&self) -> Option<TouchStick> {
        self.aim_touch
    }

    /// Normalized move-stick vector (zero inside the deadzone or when unbound)
    pub fn move_stick(&self) -> Vec2 {
        self.move_touch
            .map(|s| stick_vector(s.pos, self.move_center()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Normalized aim-stick vector, if bound
    pub fn aim_stick(&self) -> Option<Vec2> {
        self.aim_touch.map(|s| stick_vector(s.pos, self.aim_center()))
    }

    /// Combined discrete and stick movement, unit length or zero
    pub fn move_dir(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        let keys = Vec2::new(axis(self.left, self.right), axis(self.up, self.down));
        unit_or_zero(keys + self.move_stick())
    }

    /// Snapshot for the next tick
    pub fn snapshot(&self) -> TickInput {
        // A bound aim stick always steers; only the deadzone gates firing
        let aim_delta = self.aim_touch.map(|s| s.pos - self.aim_center());
        let aim = match (aim_delta, self.pointer) {
            (Some(delta), _) if delta != Vec2::ZERO => Aim::Stick(unit_or_zero(delta)),
            (Some(_), _) => Aim::Hold,
            (None, Some(p)) => Aim::Pointer(p),
            (None, None) => Aim::Hold,
        };
        let stick_firing = self.aim_stick().is_some_and(|d| d != Vec2::ZERO);
        TickInput {
            move_dir: self.move_dir(),
            aim,
            fire: self.fire_key || self.pointer_down || stick_firing,
        }
    }
}

/// `(touch - center)` normalized, or zero inside the deadzone
pub fn stick_vector(touch: Vec2, center: Vec2) -> Vec2 {
    let delta = touch - center;
    if delta.length() < JOYSTICK_DEADZONE {
        Vec2::ZERO
    } else {
        unit_or_zero(delta)
    }
}
