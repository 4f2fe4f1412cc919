//! Palette swatches: how a slot paints, what it does on keys, and which
//! slot carries the selection marker.

mod dnd;

pub use dnd::{
    COLOR_DATA_FORMAT,
    COLOR_DATA_LEN,
    COLOR_MIME_TYPE,
    DragDataError,
    decode_color,
    encode_color,
};

use kurbo::{Rect, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::input::Key;
use crate::palette::CUSTOM_PALETTE_CAPACITY;

/// Side of one checkerboard cell.
pub const CHECK_SIZE: f64 = 16.0;

const CHECK_DARK: f32 = 0.5;
const CHECK_LIGHT: f32 = 0.75;

/// A palette slot. Slots are identified by position, not by color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwatchRef {
    Builtin(usize),
    Custom(usize),
}

/// Things a swatch can ask the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwatchAction {
    /// Make the swatch color the current color.
    Activate,
    /// Store the current color into this slot.
    SaveCurrent,
}

/// Interaction state of one swatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwatchState {
    pub selected: bool,
    pub focused: bool,
}

/// How a paint operation applies its color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintKind {
    Fill,
    Stroke { width: f64 },
}

/// One step of a swatch paint plan, in swatch-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintOp {
    pub rect: Rect,
    pub color: Color,
    pub kind: PaintKind,
}

/// A palette slot and the color it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Swatch {
    pub slot: SwatchRef,
    /// `None` for an empty custom slot.
    pub color: Option<Rgba>,
    /// Whether alpha is shown and dragged.
    pub use_alpha: bool,
}

impl Swatch {
    pub fn new(slot: SwatchRef, color: Option<Rgba>, use_alpha: bool) -> Self {
        Self { slot, color, use_alpha }
    }

    /// The color as displayed, opaque unless alpha is in use.
    pub fn display_color(&self) -> Option<Rgba> {
        self.color
            .map(|c| if self.use_alpha { c } else { c.with_alpha(1.0) })
    }

    /// Build the paint plan for a swatch of `size`.
    ///
    /// Translucent colors go over a checkerboard. Focus and selection are
    /// outlined in black or white, whichever contrasts with the color.
    pub fn paint(&self, size: Size, state: SwatchState) -> Vec<PaintOp> {
        let Some(color) = self.display_color() else {
            return Vec::new();
        };
        let bounds = size.to_rect();
        let mut ops = Vec::new();

        if color.alpha < 1.0 {
            ops.extend(checkerboard(bounds));
        }

        ops.push(PaintOp { rect: bounds, color: color.into(), kind: PaintKind::Fill });

        let outline = if color.intensity() > 0.5 { Color::BLACK } else { Color::WHITE };
        if state.focused {
            ops.push(PaintOp {
                rect: bounds.inset(-1.5),
                color: outline,
                kind: PaintKind::Stroke { width: 1.0 },
            });
        }
        if state.selected {
            ops.push(PaintOp {
                rect: bounds.inset(-4.0),
                color: outline,
                kind: PaintKind::Stroke { width: 2.0 },
            });
        }
        ops
    }

    /// Map a key press on a focused swatch to an action.
    pub fn handle_key(&self, key: &Key) -> Option<SwatchAction> {
        (key.is_activate() && self.color.is_some()).then_some(SwatchAction::Activate)
    }

    /// Actions offered on right-click or long-press.
    pub fn context_actions(&self) -> &'static [SwatchAction] {
        &[SwatchAction::SaveCurrent]
    }

    /// The drag payload for this swatch.
    pub fn drag_data(&self) -> Option<[u8; COLOR_DATA_LEN]> {
        self.color.map(|c| encode_color(&c, self.use_alpha))
    }
}

fn checkerboard(bounds: Rect) -> Vec<PaintOp> {
    let mut ops = vec![PaintOp {
        rect: bounds,
        color: Color::new([CHECK_DARK, CHECK_DARK, CHECK_DARK, 1.0]),
        kind: PaintKind::Fill,
    }];
    let light = Color::new([CHECK_LIGHT, CHECK_LIGHT, CHECK_LIGHT, 1.0]);

    let columns = (bounds.width() / CHECK_SIZE).ceil() as usize;
    let rows = (bounds.height() / CHECK_SIZE).ceil() as usize;
    for row in 0..rows {
        for column in 0..columns {
            if (row + column) % 2 == 0 {
                continue;
            }
            let x = bounds.x0 + column as f64 * CHECK_SIZE;
            let y = bounds.y0 + row as f64 * CHECK_SIZE;
            let cell = Rect::new(x, y, x + CHECK_SIZE, y + CHECK_SIZE).intersect(bounds);
            ops.push(PaintOp { rect: cell, color: light, kind: PaintKind::Fill });
        }
    }
    ops
}

/// Tracks the selected and focused swatch.
///
/// The selected slot remembers the color it was selected with so that it
/// can follow that color when the palettes are reloaded.
#[derive(Debug, Clone, Default)]
pub struct SwatchMarker {
    selected: Option<(SwatchRef, Rgba)>,
    focused: Option<SwatchRef>,
}

impl SwatchMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `slot`. Returns false if it was already marked with this color.
    pub fn select(&mut self, slot: SwatchRef, color: Rgba) -> bool {
        if let Some((current, marked)) = &self.selected {
            if *current == slot && marked.eq_u16(&color) {
                return false;
            }
        }
        self.selected = Some((slot, color));
        true
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<SwatchRef> {
        self.selected.map(|(slot, _)| slot)
    }

    pub fn focused(&self) -> Option<SwatchRef> {
        self.focused
    }

    pub fn set_focused(&mut self, slot: Option<SwatchRef>) {
        self.focused = slot;
    }

    pub fn state(&self, slot: SwatchRef) -> SwatchState {
        SwatchState {
            selected: self.selected() == Some(slot),
            focused: self.focused == Some(slot),
        }
    }

    /// Shift custom references after an insert at the front of the custom palette.
    pub fn shift_custom(&mut self) {
        let shift = |slot: SwatchRef| match slot {
            SwatchRef::Custom(i) if i + 1 < CUSTOM_PALETTE_CAPACITY => Some(SwatchRef::Custom(i + 1)),
            SwatchRef::Custom(_) => None,
            builtin => Some(builtin),
        };
        self.selected = self
            .selected
            .and_then(|(slot, color)| shift(slot).map(|s| (s, color)));
        self.focused = self.focused.and_then(shift);
    }

    /// Re-validate the marker against reloaded palettes.
    ///
    /// The marker stays if its slot still holds the marked color, moves to
    /// the first slot that does, or is cleared. Returns whether it changed.
    pub fn reconcile(&mut self, builtin: &[Rgba], custom: &[Rgba]) -> bool {
        let Some((slot, color)) = self.selected else {
            return false;
        };

        if slot_color(slot, builtin, custom).is_some_and(|c| c.eq_u16(&color)) {
            return false;
        }

        let found = builtin
            .iter()
            .position(|c| c.eq_u16(&color))
            .map(SwatchRef::Builtin)
            .or_else(|| custom.iter().position(|c| c.eq_u16(&color)).map(SwatchRef::Custom));

        self.selected = found.map(|s| (s, color));
        true
    }
}

/// Look up the color stored at `slot`.
pub fn slot_color(slot: SwatchRef, builtin: &[Rgba], custom: &[Rgba]) -> Option<Rgba> {
    match slot {
        SwatchRef::Builtin(i) => builtin.get(i).copied(),
        SwatchRef::Custom(i) => custom.get(i).copied(),
    }
}
