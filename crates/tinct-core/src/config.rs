//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::settings::DEFAULT_PALETTE_KEY;

/// Default eyedropper step, in pixels, when the accelerator is held.
pub const DEFAULT_BIG_STEP: i32 = 20;

/// Options fixed when an editor is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Whether alpha is editable.
    pub has_opacity: bool,
    /// Whether a palette view is attached.
    pub has_palette: bool,
    /// Apply the stored `selected-color` at startup.
    pub restore_selected_color: bool,
    /// Settings key of the builtin palette string.
    pub palette_key: String,
    /// Eyedropper arrow-key step with the accelerator held.
    pub big_step: i32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            has_opacity: true,
            has_palette: true,
            restore_selected_color: true,
            palette_key: DEFAULT_PALETTE_KEY.to_string(),
            big_step: DEFAULT_BIG_STEP,
        }
    }
}

impl EditorConfig {
    /// Parse from JSON. Missing keys take their defaults; unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
