//! Screen-pixel picking.
//!
//! The eyedropper grabs the keyboard and then the pointer through an
//! [`EyedropperHost`], samples under the pointer on motion, and finishes on
//! commit, Escape or a broken grab. Both grabs are always released together.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgba;
use crate::config::DEFAULT_BIG_STEP;
use crate::input::{InputEvent, Key, Modifiers, MouseButton};

/// Input devices the eyedropper grabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrabDevice {
    Keyboard,
    Pointer,
}

/// Cursor shown while a grab is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorShape {
    Crosshair,
}

/// Opaque token for a held grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrabHandle(pub u64);

/// Eyedropper errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EyedropperError {
    #[error("Screen capture unavailable")]
    ScreenCaptureUnavailable,
    #[error("Failed to grab {0:?}")]
    GrabFailed(GrabDevice),
    #[error("Eyedropper already active")]
    AlreadyActive,
}

/// Result type for eyedropper operations.
pub type EyedropperResult<T> = Result<T, EyedropperError>;

/// Window-system capabilities the eyedropper needs.
pub trait EyedropperHost {
    /// Grab a device on an off-screen surrogate target. `None` if refused.
    fn grab(&mut self, device: GrabDevice, cursor: Option<CursorShape>) -> Option<GrabHandle>;

    /// Release a grab.
    fn ungrab(&mut self, handle: GrabHandle);

    /// Current pointer position in root coordinates.
    fn pointer_position(&self) -> Point;

    /// Move the pointer.
    fn warp_pointer(&mut self, position: Point);

    /// Read the root-surface pixel at `position`.
    fn sample_at(&mut self, position: Point) -> EyedropperResult<[u8; 3]>;
}

/// What handling one event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// The event was not for the eyedropper.
    Ignored,
    /// The pointer was moved by the keyboard.
    Moved(Point),
    /// A pixel was sampled; the pick continues.
    Preview(Rgba),
    /// A pixel was sampled and the pick ended.
    Committed(Rgba),
    /// The pick ended without a new sample.
    Cancelled,
    /// Sampling failed and the pick ended.
    Aborted(EyedropperError),
}

struct Session {
    keyboard: GrabHandle,
    pointer: GrabHandle,
}

/// One editor's eyedropper.
pub struct Eyedropper {
    host: Box<dyn EyedropperHost>,
    session: Option<Session>,
    big_step: i32,
}

impl Eyedropper {
    pub fn new(host: Box<dyn EyedropperHost>) -> Self {
        Self { host, session: None, big_step: DEFAULT_BIG_STEP }
    }

    /// Set the arrow-key step used with the accelerator.
    pub fn with_big_step(mut self, big_step: i32) -> Self {
        self.big_step = big_step;
        self
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Acquire the keyboard then the pointer grab.
    ///
    /// If the pointer grab is refused the keyboard grab is released again.
    pub fn begin(&mut self) -> EyedropperResult<()> {
        if self.session.is_some() {
            return Err(EyedropperError::AlreadyActive);
        }

        let keyboard = self.host.grab(GrabDevice::Keyboard, None).ok_or_else(|| {
            log::warn!("Eyedropper keyboard grab refused");
            EyedropperError::GrabFailed(GrabDevice::Keyboard)
        })?;

        let Some(pointer) = self.host.grab(GrabDevice::Pointer, Some(CursorShape::Crosshair))
        else {
            log::warn!("Eyedropper pointer grab refused");
            self.host.ungrab(keyboard);
            return Err(EyedropperError::GrabFailed(GrabDevice::Pointer));
        };

        log::debug!("Eyedropper active");
        self.session = Some(Session { keyboard, pointer });
        Ok(())
    }

    /// Release both grabs. Safe to call when inactive.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            self.host.ungrab(session.pointer);
            self.host.ungrab(session.keyboard);
            log::debug!("Eyedropper released");
        }
    }

    /// Feed one grabbed input event.
    pub fn handle_event(&mut self, event: &InputEvent) -> PickOutcome {
        if self.session.is_none() {
            return PickOutcome::Ignored;
        }

        match event {
            InputEvent::PointerMove { position } => match self.sample(*position) {
                Ok(rgba) => PickOutcome::Preview(rgba),
                Err(e) => self.abort(e),
            },
            InputEvent::PointerDown { position, button: MouseButton::Left } => {
                self.commit(*position)
            }
            InputEvent::PointerDown { .. } => PickOutcome::Ignored,
            InputEvent::KeyDown { key, modifiers } => self.handle_key(key, modifiers),
            InputEvent::GrabBroken => {
                log::debug!("Eyedropper grab broken");
                self.cancel();
                PickOutcome::Cancelled
            }
        }
    }

    fn handle_key(&mut self, key: &Key, modifiers: &Modifiers) -> PickOutcome {
        if key.is_activate() {
            let position = self.host.pointer_position();
            return self.commit(position);
        }

        if *key == Key::Escape {
            self.cancel();
            return PickOutcome::Cancelled;
        }

        let Some(unit) = key.arrow_delta() else {
            return PickOutcome::Ignored;
        };
        let step = if modifiers.accelerator() { f64::from(self.big_step) } else { 1.0 };
        let target = self.host.pointer_position() + Vec2::new(unit.x * step, unit.y * step);
        self.host.warp_pointer(target);
        PickOutcome::Moved(target)
    }

    fn commit(&mut self, position: Point) -> PickOutcome {
        let outcome = match self.sample(position) {
            Ok(rgba) => PickOutcome::Committed(rgba),
            Err(e) => return self.abort(e),
        };
        self.cancel();
        outcome
    }

    fn abort(&mut self, error: EyedropperError) -> PickOutcome {
        log::debug!("Eyedropper aborted: {}", error);
        self.cancel();
        PickOutcome::Aborted(error)
    }

    fn sample(&mut self, position: Point) -> EyedropperResult<Rgba> {
        let [r, g, b] = self.host.sample_at(position)?;
        Ok(Rgba::from_rgb8(r, g, b))
    }
}

impl Drop for Eyedropper {
    fn drop(&mut self) {
        self.cancel();
    }
}
