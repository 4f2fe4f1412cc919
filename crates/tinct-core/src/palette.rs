//! Builtin and custom palettes, and their persisted string form.

use crate::color::{ParseResult, Rgba, format_hex, parse_color};
use crate::settings::{SettingsBridge, SettingsStore};

/// Builtin palette columns.
pub const BUILTIN_PALETTE_WIDTH: usize = 10;
/// Builtin palette rows.
pub const BUILTIN_PALETTE_HEIGHT: usize = 2;
/// Builtin palette entries.
pub const BUILTIN_PALETTE_SIZE: usize = BUILTIN_PALETTE_WIDTH * BUILTIN_PALETTE_HEIGHT;
/// Maximum number of custom colors kept.
pub const CUSTOM_PALETTE_CAPACITY: usize = 9;

/// Compiled default for the builtin palette.
pub const DEFAULT_COLOR_PALETTE: &str = "black:white:gray50:red:purple:blue:light blue:green:yellow:orange:lavender:brown:goldenrod4:dodger blue:pink:light green:gray10:gray30:gray75:gray90";

/// Parse a `:`-separated palette string. An empty string is an empty palette;
/// any empty or unparseable element rejects the whole string.
pub fn parse_palette(s: &str) -> ParseResult<Vec<Rgba>> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(':').map(parse_color).collect()
}

/// Format colors as `#RRGGBB` entries joined with `:`.
pub fn format_palette(colors: &[Rgba]) -> String {
    colors.iter().map(format_hex).collect::<Vec<_>>().join(":")
}

/// The compiled default builtin palette.
pub fn default_builtin() -> Vec<Rgba> {
    match parse_palette(DEFAULT_COLOR_PALETTE) {
        Ok(colors) if colors.len() == BUILTIN_PALETTE_SIZE => colors,
        Ok(colors) => {
            log::error!("Default palette has {} entries", colors.len());
            complete_builtin(colors, &[])
        }
        Err(e) => {
            log::error!("Default palette does not parse: {}", e);
            vec![Rgba::WHITE; BUILTIN_PALETTE_SIZE]
        }
    }
}

/// Pad or truncate to exactly [`BUILTIN_PALETTE_SIZE`] entries, filling the
/// tail from `defaults` (then white). Every entry is made opaque.
fn complete_builtin(mut colors: Vec<Rgba>, defaults: &[Rgba]) -> Vec<Rgba> {
    colors.truncate(BUILTIN_PALETTE_SIZE);
    let start = colors.len();
    colors.extend(
        (start..BUILTIN_PALETTE_SIZE).map(|i| defaults.get(i).copied().unwrap_or(Rgba::WHITE)),
    );
    colors.into_iter().map(|c| c.with_alpha(1.0)).collect()
}

/// Resolve a stored palette string into exactly 20 colors.
pub fn builtin_from_string(stored: Option<&str>) -> Vec<Rgba> {
    let defaults = default_builtin();
    let Some(stored) = stored else {
        return defaults;
    };
    match parse_palette(stored) {
        Ok(colors) => {
            if colors.len() < BUILTIN_PALETTE_SIZE {
                log::debug!(
                    "Stored palette has {} entries, filling from defaults",
                    colors.len()
                );
            }
            complete_builtin(colors, &defaults)
        }
        Err(e) => {
            log::debug!("Stored palette rejected ({}), using defaults", e);
            defaults
        }
    }
}

/// Working copy of both palettes, persisted through a [`SettingsBridge`].
///
/// Persistence failures are logged; the working copy stays authoritative.
pub struct PaletteStore<S: SettingsStore> {
    bridge: SettingsBridge<S>,
    builtin: Vec<Rgba>,
    custom: Vec<Rgba>,
    revision: u64,
}

impl<S: SettingsStore> PaletteStore<S> {
    /// Create a store and load both palettes.
    pub fn new(bridge: SettingsBridge<S>) -> Self {
        let mut store = Self { bridge, builtin: Vec::new(), custom: Vec::new(), revision: 0 };
        store.builtin = store.load_builtin();
        store.custom = store.load_custom();
        store
    }

    /// Read the builtin palette from settings, falling back to defaults.
    pub fn load_builtin(&self) -> Vec<Rgba> {
        builtin_from_string(self.bridge.palette_string().as_deref())
    }

    /// Read the custom palette from settings, truncated to capacity.
    pub fn load_custom(&self) -> Vec<Rgba> {
        let mut colors = self.bridge.custom_colors();
        colors.truncate(CUSTOM_PALETTE_CAPACITY);
        colors
    }

    /// Write `colors` as the custom palette.
    pub fn save_custom(&self, colors: &[Rgba]) {
        debug_assert!(colors.len() <= CUSTOM_PALETTE_CAPACITY);
        let colors = &colors[..colors.len().min(CUSTOM_PALETTE_CAPACITY)];
        if let Err(e) = self.bridge.set_custom_colors(colors) {
            log::warn!("Failed to save custom colors: {}", e);
        }
    }

    /// Prepend to the custom palette, evicting the oldest entry when full, and save.
    pub fn insert_custom(&mut self, rgba: Rgba) {
        self.custom.insert(0, rgba.clamped());
        self.custom.truncate(CUSTOM_PALETTE_CAPACITY);
        self.touch();
        self.save_custom(&self.custom);
    }

    /// Overwrite one custom entry and save. Out-of-range indices are ignored.
    pub fn set_custom(&mut self, index: usize, rgba: Rgba) -> bool {
        let Some(slot) = self.custom.get_mut(index) else {
            log::debug!("Custom slot {} does not exist", index);
            return false;
        };
        *slot = rgba.clamped();
        self.touch();
        self.save_custom(&self.custom);
        true
    }

    /// Overwrite one builtin entry and persist the palette string.
    ///
    /// Builtin entries are opaque and held at the 8-bit precision of the
    /// stored string, so the working copy matches what is persisted.
    pub fn save_slot(&mut self, index: usize, rgba: Rgba) -> bool {
        let Some(slot) = self.builtin.get_mut(index) else {
            log::debug!("Builtin slot {} does not exist", index);
            return false;
        };
        let [r, g, b] = rgba.clamped().to_rgb8();
        *slot = Rgba::from_rgb8(r, g, b);
        self.touch();
        if let Err(e) = self.bridge.set_palette_string(&format_palette(&self.builtin)) {
            log::warn!("Failed to save palette: {}", e);
        }
        true
    }

    /// Replace the builtin working copy from a stored string.
    /// Returns whether anything changed.
    pub fn apply_palette_string(&mut self, stored: Option<&str>) -> bool {
        let builtin = builtin_from_string(stored);
        if same_colors(&builtin, &self.builtin) {
            return false;
        }
        self.builtin = builtin;
        self.touch();
        true
    }

    /// Replace the custom working copy. Returns whether anything changed.
    pub fn apply_custom(&mut self, mut colors: Vec<Rgba>) -> bool {
        colors.truncate(CUSTOM_PALETTE_CAPACITY);
        if same_colors(&colors, &self.custom) {
            return false;
        }
        self.custom = colors;
        self.touch();
        true
    }

    /// Re-read both palettes from settings. Returns whether anything changed.
    pub fn reload(&mut self) -> bool {
        let stored = self.bridge.palette_string();
        let builtin_changed = self.apply_palette_string(stored.as_deref());
        let custom_changed = self.apply_custom(self.load_custom());
        builtin_changed || custom_changed
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn builtin(&self) -> &[Rgba] {
        &self.builtin
    }

    pub fn custom(&self) -> &[Rgba] {
        &self.custom
    }

    /// Bumped on every working-copy change; hosts redraw swatches when it moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn bridge(&self) -> &SettingsBridge<S> {
        &self.bridge
    }
}

fn same_colors(a: &[Rgba], b: &[Rgba]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_u16(y))
}
