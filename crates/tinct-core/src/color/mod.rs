//! Color values and the RGB/HSV arithmetic shared by every editor surface.
//!
//! RGBA is the canonical representation; HSV is always derived from it or
//! written alongside it by the selection model.

mod parse;

pub use parse::{ParseError, ParseResult, format_hex, parse_color, parse_hex};

use serde::{Deserialize, Serialize};

/// Clamp a channel to `[0, 1]`. NaN collapses to 0.
#[inline]
pub fn clamp_channel(value: f64) -> f64 {
    if value.is_nan() {
        log::trace!("channel value NaN clamped to 0");
        return 0.0;
    }
    if !(0.0..=1.0).contains(&value) {
        log::trace!("channel value {} clamped to [0, 1]", value);
    }
    value.clamp(0.0, 1.0)
}

/// Map a unit value onto `[0, scale]` as `floor(x * scale + 0.5)`.
///
/// Every displayed integer (spin boxes, hex digits, 16-bit channels) goes
/// through this so a shown value always converts back to itself.
#[inline]
pub fn scale_round(value: f64, scale: u32) -> u32 {
    let scaled = (clamp_channel(value) * f64::from(scale) + 0.5).floor();
    (scaled as u32).min(scale)
}

/// An RGBA color with every channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Rgba {
    /// Opaque white, the color a fresh editor starts with.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Create a color without clamping.
    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Create an opaque color.
    pub const fn opaque(red: f64, green: f64, blue: f64) -> Self {
        Self::new(red, green, blue, 1.0)
    }

    /// Create an opaque color from 8-bit channels.
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self::opaque(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
        )
    }

    /// Create a color from 16-bit channels.
    pub fn from_u16(channels: [u16; 4]) -> Self {
        let [r, g, b, a] = channels.map(|c| f64::from(c) / 65535.0);
        Self::new(r, g, b, a)
    }

    /// Return a copy with every channel clamped to `[0, 1]`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(
            clamp_channel(self.red),
            clamp_channel(self.green),
            clamp_channel(self.blue),
            clamp_channel(self.alpha),
        )
    }

    /// Return a copy with a different alpha.
    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    /// The 8-bit RGB triple shown in spin boxes and hex entries.
    pub fn to_rgb8(self) -> [u8; 3] {
        [self.red, self.green, self.blue].map(|c| scale_round(c, 255) as u8)
    }

    /// The 16-bit channels used by persistence and drag-and-drop.
    pub fn to_u16(self) -> [u16; 4] {
        [self.red, self.green, self.blue, self.alpha].map(|c| scale_round(c, 65535) as u16)
    }

    /// Compare two colors at 16-bit precision.
    pub fn eq_u16(&self, other: &Self) -> bool {
        self.to_u16() == other.to_u16()
    }

    /// Compare the RGB part at 16-bit precision, ignoring alpha.
    pub fn eq_rgb_u16(&self, other: &Self) -> bool {
        self.to_u16()[..3] == other.to_u16()[..3]
    }

    /// Perceived brightness, used to pick a contrasting focus outline.
    pub fn intensity(&self) -> f64 {
        self.red * 0.30 + self.green * 0.59 + self.blue * 0.11
    }

    /// Derive HSV, keeping `fallback_hue` when the color is a gray.
    pub fn to_hsv(self, fallback_hue: f64) -> Hsv {
        rgb_to_hsv(self.red, self.green, self.blue, fallback_hue)
    }
}

impl From<Rgba> for peniko::Color {
    fn from(rgba: Rgba) -> Self {
        peniko::Color::new([
            rgba.red as f32,
            rgba.green as f32,
            rgba.blue as f32,
            rgba.alpha as f32,
        ])
    }
}

impl From<peniko::Color> for Rgba {
    fn from(color: peniko::Color) -> Self {
        let [r, g, b, a] = color.components;
        Self::new(f64::from(r), f64::from(g), f64::from(b), f64::from(a)).clamped()
    }
}

impl std::str::FromStr for Rgba {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

/// Hue, saturation and value, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl Hsv {
    pub const fn new(hue: f64, saturation: f64, value: f64) -> Self {
        Self { hue, saturation, value }
    }

    /// Return a copy with every component clamped to `[0, 1]`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(
            clamp_channel(self.hue),
            clamp_channel(self.saturation),
            clamp_channel(self.value),
        )
    }

    /// Convert to an RGBA color with the given alpha.
    pub fn to_rgba(self, alpha: f64) -> Rgba {
        let (r, g, b) = hsv_to_rgb(self.hue, self.saturation, self.value);
        Rgba::new(r, g, b, alpha)
    }

    /// Compare at 16-bit precision.
    pub fn eq_u16(&self, other: &Self) -> bool {
        let quantize = |h: &Self| {
            [h.hue, h.saturation, h.value].map(|c| scale_round(c, 65535))
        };
        quantize(self) == quantize(other)
    }
}

/// HSV plus the alpha channel it shares with RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsva {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
    pub alpha: f64,
}

impl Hsva {
    pub const fn new(hue: f64, saturation: f64, value: f64, alpha: f64) -> Self {
        Self { hue, saturation, value, alpha }
    }

    /// Split into the HSV part and alpha.
    pub fn split(self) -> (Hsv, f64) {
        (Hsv::new(self.hue, self.saturation, self.value), self.alpha)
    }
}

/// Convert RGB to HSV.
///
/// Inputs are clamped. When `max == min` the hue is undefined and
/// `fallback_hue` is returned unchanged, so a gray keeps its ring position.
pub fn rgb_to_hsv(red: f64, green: f64, blue: f64, fallback_hue: f64) -> Hsv {
    let (r, g, b) = (clamp_channel(red), clamp_channel(green), clamp_channel(blue));

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let value = max;
    let saturation = if max > 0.0 { delta / max } else { 0.0 };

    if delta <= 0.0 {
        return Hsv::new(clamp_channel(fallback_hue), saturation, value);
    }

    let mut hue = if r == max {
        (g - b) / delta
    } else if g == max {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };

    hue /= 6.0;
    if hue < 0.0 {
        hue += 1.0;
    }
    if hue >= 1.0 {
        hue -= 1.0;
    }

    Hsv::new(hue, saturation, value)
}

/// Convert HSV to RGB. Inputs are clamped; a hue of 1 is the same as 0.
pub fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> (f64, f64, f64) {
    let (h, s, v) = (clamp_channel(hue), clamp_channel(saturation), clamp_channel(value));

    if s == 0.0 {
        return (v, v, v);
    }

    let mut sector = h * 6.0;
    if sector >= 6.0 {
        sector = 0.0;
    }

    let i = sector.floor();
    let f = sector - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match i as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}
