//! Tinct Core Library
//!
//! Platform-agnostic color selection: color arithmetic, the selection model,
//! palettes, the editor controller, the eyedropper and settings persistence.

pub mod color;
pub mod config;
pub mod editor;
pub mod eyedropper;
pub mod input;
pub mod palette;
pub mod selection;
pub mod settings;
pub mod swatch;

pub use color::{Hsv, Hsva, ParseError, Rgba, format_hex, parse_color};
pub use config::EditorConfig;
pub use editor::{Channel, ColorView, DragSource, Editor, EditorState, ViewId, ViewValue};
pub use eyedropper::{Eyedropper, EyedropperError, EyedropperHost, PickOutcome};
pub use input::{InputEvent, Key, Modifiers, MouseButton};
pub use palette::PaletteStore;
pub use selection::Selection;
pub use settings::{MemorySettings, SettingValue, SettingsBridge, SettingsError, SettingsStore};
pub use swatch::{COLOR_MIME_TYPE, Swatch, SwatchMarker, SwatchRef};
