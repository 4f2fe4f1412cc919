//! Color string parsing and formatting.
//!
//! Accepts `#RGB`, `#RRGGBB`, `#RRRGGGBBB`, `#RRRRGGGGBBBB`, the X11 color
//! names used by the built-in palette, and anything the CSS color parser
//! understands (`rgb(...)`, `hsl(...)`, named colors).

use thiserror::Error;

use super::{Rgba, scale_round};

/// Errors produced while parsing a color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty color string")]
    Empty,

    #[error("invalid hex color: {0}")]
    InvalidHex(String),

    #[error("unrecognised color: {0}")]
    InvalidSyntax(String),
}

impl ParseError {
    /// Every parse failure is a syntax failure; the variants only refine the message.
    pub fn is_invalid_syntax(&self) -> bool {
        true
    }
}

/// Result type for color parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// X11 names that either differ from CSS or carry a numeric suffix.
const X11_EXTRAS: &[(&str, [u8; 3])] = &[
    ("goldenrod1", [0xFF, 0xC1, 0x25]),
    ("goldenrod2", [0xEE, 0xB4, 0x22]),
    ("goldenrod3", [0xCD, 0x9B, 0x1D]),
    ("goldenrod4", [0x8B, 0x69, 0x14]),
    ("gray", [0xBE, 0xBE, 0xBE]),
    ("grey", [0xBE, 0xBE, 0xBE]),
    ("green", [0x00, 0xFF, 0x00]),
    ("maroon", [0xB0, 0x30, 0x60]),
    ("purple", [0xA0, 0x20, 0xF0]),
];

/// Levels of the X11 `gray0` to `gray100` names.
const X11_GRAY_LEVELS: [u8; 101] = [
    0x00, 0x03, 0x05, 0x08, 0x0A, 0x0D, 0x0F, 0x12, 0x14, 0x17,
    0x1A, 0x1C, 0x1F, 0x21, 0x24, 0x26, 0x29, 0x2B, 0x2E, 0x30,
    0x33, 0x36, 0x38, 0x3B, 0x3D, 0x40, 0x42, 0x45, 0x47, 0x4A,
    0x4D, 0x4F, 0x52, 0x54, 0x57, 0x59, 0x5C, 0x5E, 0x61, 0x63,
    0x66, 0x69, 0x6B, 0x6E, 0x70, 0x73, 0x75, 0x78, 0x7A, 0x7D,
    0x7F, 0x82, 0x85, 0x87, 0x8A, 0x8C, 0x8F, 0x91, 0x94, 0x96,
    0x99, 0x9C, 0x9E, 0xA1, 0xA3, 0xA6, 0xA8, 0xAB, 0xAD, 0xB0,
    0xB3, 0xB5, 0xB8, 0xBA, 0xBD, 0xBF, 0xC2, 0xC4, 0xC7, 0xC9,
    0xCC, 0xCF, 0xD1, 0xD4, 0xD6, 0xD9, 0xDB, 0xDE, 0xE0, 0xE3,
    0xE5, 0xE8, 0xEB, 0xED, 0xF0, 0xF2, 0xF5, 0xF7, 0xFA, 0xFC,
    0xFF,
];

/// Parse a color string into an opaque (or CSS-specified alpha) color.
pub fn parse_color(s: &str) -> ParseResult<Rgba> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    if trimmed.starts_with('#') {
        return parse_hex(trimmed);
    }

    if !trimmed.contains('(') {
        if let Some(rgba) = parse_x11_name(trimmed) {
            return Ok(rgba);
        }
    }

    parse_css(trimmed)
}

/// Parse a `#`-prefixed hex color with 1 to 4 digits per channel.
pub fn parse_hex(s: &str) -> ParseResult<Rgba> {
    let digits = s
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| ParseError::InvalidHex(s.to_string()))?;

    if !digits.bytes().all(|b| b.is_ascii_hexdigit())
        || digits.is_empty()
        || digits.len() % 3 != 0
        || digits.len() > 12
    {
        return Err(ParseError::InvalidHex(s.to_string()));
    }

    let width = digits.len() / 3;
    let max = f64::from((1u32 << (4 * width)) - 1);

    let channel = |i: usize| -> ParseResult<f64> {
        let part = &digits[i * width..(i + 1) * width];
        u16::from_str_radix(part, 16)
            .map(|v| f64::from(v) / max)
            .map_err(|_| ParseError::InvalidHex(s.to_string()))
    };

    Ok(Rgba::opaque(channel(0)?, channel(1)?, channel(2)?))
}

/// Format the RGB part as an uppercase `#RRGGBB` string.
pub fn format_hex(rgba: &Rgba) -> String {
    format!(
        "#{:02X}{:02X}{:02X}",
        scale_round(rgba.red, 255),
        scale_round(rgba.green, 255),
        scale_round(rgba.blue, 255)
    )
}

fn parse_x11_name(name: &str) -> Option<Rgba> {
    let normalized: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if let Some(level) = normalized
        .strip_prefix("gray")
        .or_else(|| normalized.strip_prefix("grey"))
        .filter(|rest| !rest.is_empty())
    {
        if !level.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let v = *level.parse::<usize>().ok().and_then(|l| X11_GRAY_LEVELS.get(l))?;
        return Some(Rgba::from_rgb8(v, v, v));
    }

    X11_EXTRAS
        .iter()
        .find(|(n, _)| *n == normalized)
        .map(|(_, [r, g, b])| Rgba::from_rgb8(*r, *g, *b))
        .or_else(|| {
            // Multi-word X11 names ("light blue") map onto CSS names.
            (normalized.len() != name.len()).then(|| parse_css(&normalized).ok()).flatten()
        })
}

fn parse_css(s: &str) -> ParseResult<Rgba> {
    let dynamic = peniko::color::parse_color(s).map_err(|e| {
        log::debug!("CSS color parse failed for {:?}: {}", s, e);
        ParseError::InvalidSyntax(s.to_string())
    })?;
    let color = dynamic.to_alpha_color::<peniko::color::Srgb>();
    Ok(Rgba::from(color))
}
