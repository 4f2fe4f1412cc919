//! Typed access to the color keys of a [`SettingsStore`].

use super::{SettingChange, SettingValue, SettingsError, SettingsResult, SettingsStore};
use crate::color::Rgba;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};

/// Key holding `(enabled, r, g, b, a)` for the last selected swatch.
pub const SELECTED_COLOR_KEY: &str = "selected-color";

/// Key holding the custom palette as an array of `(r, g, b, a)`.
pub const CUSTOM_COLORS_KEY: &str = "custom-colors";

/// Default key holding the builtin palette string.
pub const DEFAULT_PALETTE_KEY: &str = "ctk-color-palette";

/// Reads and writes the color settings in their stored shapes.
///
/// Cloning is cheap; clones share the store.
pub struct SettingsBridge<S: SettingsStore> {
    store: Arc<S>,
    palette_key: String,
}

impl<S: SettingsStore> Clone for SettingsBridge<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), palette_key: self.palette_key.clone() }
    }
}

impl<S: SettingsStore> SettingsBridge<S> {
    pub fn new(store: Arc<S>, palette_key: impl Into<String>) -> Self {
        Self { store, palette_key: palette_key.into() }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The key the builtin palette string is stored under.
    pub fn palette_key(&self) -> &str {
        &self.palette_key
    }

    /// Subscribe to all three color keys on one channel.
    pub fn observe(&self) -> Receiver<SettingChange> {
        let (tx, rx) = channel();
        self.store.observe(SELECTED_COLOR_KEY, tx.clone());
        self.store.observe(CUSTOM_COLORS_KEY, tx.clone());
        self.store.observe(&self.palette_key, tx);
        rx
    }

    fn read(&self, key: &str) -> Option<SettingValue> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read setting {}: {}", key, e);
                None
            }
        }
    }

    /// The stored selected color, if present and enabled.
    pub fn selected_color(&self) -> Option<Rgba> {
        self.read(SELECTED_COLOR_KEY).and_then(|v| decode_selected_color(&v))
    }

    /// Store `rgba` as the enabled selected color.
    pub fn set_selected_color(&self, rgba: &Rgba) -> SettingsResult<()> {
        self.store.set(SELECTED_COLOR_KEY, encode_selected_color(rgba))
    }

    /// The stored custom colors in stored order. Malformed values read as empty.
    pub fn custom_colors(&self) -> Vec<Rgba> {
        match self.read(CUSTOM_COLORS_KEY) {
            Some(value) => decode_custom_colors(&value).unwrap_or_else(|e| {
                log::debug!("Ignoring stored custom colors: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    /// Store the custom colors verbatim.
    pub fn set_custom_colors(&self, colors: &[Rgba]) -> SettingsResult<()> {
        self.store.set(CUSTOM_COLORS_KEY, encode_custom_colors(colors))
    }

    /// The stored builtin palette string.
    pub fn palette_string(&self) -> Option<String> {
        let value = self.read(&self.palette_key)?;
        match value {
            SettingValue::Text(s) => Some(s),
            other => {
                log::debug!("Ignoring non-text palette setting: {:?}", other);
                None
            }
        }
    }

    /// Store the builtin palette string.
    pub fn set_palette_string(&self, palette: &str) -> SettingsResult<()> {
        self.store.set(&self.palette_key, SettingValue::Text(palette.to_string()))
    }
}

fn rgba_tuple(rgba: &Rgba) -> [SettingValue; 4] {
    [rgba.red, rgba.green, rgba.blue, rgba.alpha].map(SettingValue::Double)
}

fn tuple_rgba(items: &[SettingValue]) -> Option<Rgba> {
    let [r, g, b, a] = items else {
        return None;
    };
    Some(
        Rgba::new(r.as_double()?, g.as_double()?, b.as_double()?, a.as_double()?).clamped(),
    )
}

/// Encode `(true, r, g, b, a)`.
pub fn encode_selected_color(rgba: &Rgba) -> SettingValue {
    let mut items = vec![SettingValue::Bool(true)];
    items.extend(rgba_tuple(rgba));
    SettingValue::Tuple(items)
}

/// Decode `(enabled, r, g, b, a)`; disabled or malformed values read as `None`.
pub fn decode_selected_color(value: &SettingValue) -> Option<Rgba> {
    let items = value.as_tuple()?;
    let (enabled, channels) = items.split_first()?;
    if !enabled.as_bool()? {
        return None;
    }
    tuple_rgba(channels)
}

pub fn encode_custom_colors(colors: &[Rgba]) -> SettingValue {
    SettingValue::Array(
        colors.iter().map(|c| SettingValue::Tuple(rgba_tuple(c).to_vec())).collect(),
    )
}

pub fn decode_custom_colors(value: &SettingValue) -> SettingsResult<Vec<Rgba>> {
    let mismatch = || SettingsError::TypeMismatch {
        key: CUSTOM_COLORS_KEY.to_string(),
        expected: "array of (double, double, double, double)",
    };
    value
        .as_array()
        .ok_or_else(mismatch)?
        .iter()
        .map(|item| item.as_tuple().and_then(tuple_rgba).ok_or_else(mismatch))
        .collect()
}
