//! Input events delivered to swatches and to the eyedropper.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Whether exactly the accelerator modifier (Alt) is held.
    pub fn accelerator(&self) -> bool {
        self.alt && !self.shift && !self.ctrl && !self.meta
    }
}

/// Keys the color editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Other(String),
}

impl Key {
    /// Map a host key name ("ArrowUp", "Return", "KP_Enter", " ") to a key.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Up" | "ArrowUp" | "KP_Up" => Self::Up,
            "Down" | "ArrowDown" | "KP_Down" => Self::Down,
            "Left" | "ArrowLeft" | "KP_Left" => Self::Left,
            "Right" | "ArrowRight" | "KP_Right" => Self::Right,
            " " | "space" | "Space" | "KP_Space" => Self::Space,
            "Return" | "Enter" | "ISO_Enter" | "KP_Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether this key activates a focused control.
    pub fn is_activate(&self) -> bool {
        matches!(self, Self::Space | Self::Enter)
    }

    /// Unit movement for arrow keys.
    pub fn arrow_delta(&self) -> Option<Vec2> {
        match self {
            Self::Up => Some(Vec2::new(0.0, -1.0)),
            Self::Down => Some(Vec2::new(0.0, 1.0)),
            Self::Left => Some(Vec2::new(-1.0, 0.0)),
            Self::Right => Some(Vec2::new(1.0, 0.0)),
            _ => None,
        }
    }
}

/// Events routed to a grab while the eyedropper is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerMove {
        position: Point,
    },
    PointerDown {
        position: Point,
        button: MouseButton,
    },
    KeyDown {
        key: Key,
        modifiers: Modifiers,
    },
    /// The host took the grab away.
    GrabBroken,
}
