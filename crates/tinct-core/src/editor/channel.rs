//! Editor channels and the conversions between model values and what views show.

use std::f64::consts::TAU;

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

use crate::color::{Hsv, Rgba, clamp_channel, format_hex, parse_color, scale_round};
use crate::selection::Selection;

/// Which aspect of the color a view shows and edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Hue,
    Saturation,
    Value,
    Alpha,
    Hex,
    HsvPlane,
    HueRing,
    SwatchOld,
    SwatchNew,
}

/// Displayed range of a numeric channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelRange {
    pub lower: f64,
    pub upper: f64,
    pub wrap: bool,
}

impl ChannelRange {
    pub const fn new(lower: f64, upper: f64, wrap: bool) -> Self {
        Self { lower, upper, wrap }
    }

    /// Bring `value` into range, wrapping or clamping.
    pub fn fit(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.lower;
        }
        if self.wrap {
            let span = self.upper - self.lower;
            self.lower + (value - self.lower).rem_euclid(span)
        } else {
            value.clamp(self.lower, self.upper)
        }
    }
}

/// A value exchanged with a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewValue {
    /// Spin boxes and sliders.
    Number(f64),
    /// Text entries.
    Text(String),
    /// A point picked in a plane of `size`.
    PlanePoint { position: Point, size: Size },
    /// Hue ring angle in radians.
    Angle(f64),
    /// Full HSV, pushed to plane and ring views.
    Hsv(Hsv),
    /// A whole color, pushed to sample swatches.
    Color(Rgba),
}

/// What a view edit asks the model to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Rgb([f64; 3]),
    Hsv(Hsv),
    Alpha(f64),
    Current(Rgba),
    Previous(Rgba),
    /// Text that does not parse; the view must be restored.
    InvalidText(String),
    /// A value of the wrong shape for the channel.
    Rejected,
}

const RGB_RANGE: ChannelRange = ChannelRange::new(0.0, 255.0, false);
const HUE_RANGE: ChannelRange = ChannelRange::new(0.0, 360.0, true);
const PERCENT_RANGE: ChannelRange = ChannelRange::new(0.0, 100.0, false);

impl Channel {
    pub const ALL: [Channel; 12] = [
        Channel::Red,
        Channel::Green,
        Channel::Blue,
        Channel::Hue,
        Channel::Saturation,
        Channel::Value,
        Channel::Alpha,
        Channel::Hex,
        Channel::HsvPlane,
        Channel::HueRing,
        Channel::SwatchOld,
        Channel::SwatchNew,
    ];

    /// The displayed range for numeric channels.
    pub fn range(&self) -> Option<ChannelRange> {
        match self {
            Self::Red | Self::Green | Self::Blue | Self::Alpha => Some(RGB_RANGE),
            Self::Hue => Some(HUE_RANGE),
            Self::Saturation | Self::Value => Some(PERCENT_RANGE),
            _ => None,
        }
    }

    /// The value views of this channel show for `selection`.
    pub fn value(&self, selection: &Selection) -> ViewValue {
        let rgba = selection.current_rgba();
        let hsv = selection.current_hsv();
        match self {
            Self::Red => ViewValue::Number(f64::from(scale_round(rgba.red, 255))),
            Self::Green => ViewValue::Number(f64::from(scale_round(rgba.green, 255))),
            Self::Blue => ViewValue::Number(f64::from(scale_round(rgba.blue, 255))),
            Self::Hue => ViewValue::Number(f64::from(scale_round(hsv.hue, 360) % 360)),
            Self::Saturation => ViewValue::Number(f64::from(scale_round(hsv.saturation, 100))),
            Self::Value => ViewValue::Number(f64::from(scale_round(hsv.value, 100))),
            Self::Alpha => ViewValue::Number(f64::from(scale_round(rgba.alpha, 255))),
            Self::Hex => ViewValue::Text(format_hex(&rgba)),
            Self::HsvPlane => ViewValue::Hsv(hsv),
            Self::HueRing => ViewValue::Angle(hsv.hue * TAU),
            Self::SwatchOld => ViewValue::Color(selection.previous_rgba()),
            Self::SwatchNew => ViewValue::Color(rgba),
        }
    }

    /// Translate a view edit into a model edit.
    pub fn edit(&self, selection: &Selection, value: &ViewValue) -> Edit {
        match self {
            Self::Red | Self::Green | Self::Blue => {
                let Some(x) = number(value, RGB_RANGE) else {
                    return Edit::Rejected;
                };
                let rgba = selection.current_rgba();
                let mut rgb = [rgba.red, rgba.green, rgba.blue];
                let index = match self {
                    Self::Red => 0,
                    Self::Green => 1,
                    _ => 2,
                };
                rgb[index] = x / 255.0;
                Edit::Rgb(rgb)
            }
            Self::Hue => match number(value, HUE_RANGE) {
                Some(x) => Edit::Hsv(Hsv { hue: x / 360.0, ..selection.current_hsv() }),
                None => Edit::Rejected,
            },
            Self::Saturation => match number(value, PERCENT_RANGE) {
                Some(x) => Edit::Hsv(Hsv { saturation: x / 100.0, ..selection.current_hsv() }),
                None => Edit::Rejected,
            },
            Self::Value => match number(value, PERCENT_RANGE) {
                Some(x) => Edit::Hsv(Hsv { value: x / 100.0, ..selection.current_hsv() }),
                None => Edit::Rejected,
            },
            Self::Alpha => match number(value, RGB_RANGE) {
                Some(x) => Edit::Alpha(x / 255.0),
                None => Edit::Rejected,
            },
            Self::Hex => match value {
                ViewValue::Text(text) => match parse_color(text) {
                    Ok(rgba) => Edit::Rgb([rgba.red, rgba.green, rgba.blue]),
                    Err(e) => {
                        log::debug!("Ignoring hex entry {:?}: {}", text, e);
                        Edit::InvalidText(text.clone())
                    }
                },
                _ => Edit::Rejected,
            },
            Self::HsvPlane => match value {
                ViewValue::PlanePoint { position, size } => {
                    match plane_to_sv(*position, *size) {
                        Some((saturation, value)) => {
                            Edit::Hsv(Hsv { saturation, value, ..selection.current_hsv() })
                        }
                        None => Edit::Rejected,
                    }
                }
                ViewValue::Hsv(hsv) => Edit::Hsv(*hsv),
                _ => Edit::Rejected,
            },
            Self::HueRing => match value {
                ViewValue::Angle(angle) if angle.is_finite() => {
                    Edit::Hsv(Hsv { hue: angle_to_hue(*angle), ..selection.current_hsv() })
                }
                ViewValue::Hsv(hsv) => Edit::Hsv(*hsv),
                _ => Edit::Rejected,
            },
            Self::SwatchOld => match value {
                ViewValue::Color(rgba) => Edit::Previous(*rgba),
                _ => Edit::Rejected,
            },
            Self::SwatchNew => match value {
                ViewValue::Color(rgba) => Edit::Current(*rgba),
                _ => Edit::Rejected,
            },
        }
    }
}

fn number(value: &ViewValue, range: ChannelRange) -> Option<f64> {
    let x = match value {
        ViewValue::Number(x) => *x,
        ViewValue::Text(text) => parse_number(text),
        _ => return None,
    };
    Some(range.fit(x))
}

/// Map a point in a `size` plane to saturation (top = 1) and value (right = 1).
pub fn plane_to_sv(position: Point, size: Size) -> Option<(f64, f64)> {
    if size.width <= 0.0 || size.height <= 0.0 {
        return None;
    }
    let saturation = clamp_channel(1.0 - position.y / size.height);
    let value = clamp_channel(position.x / size.width);
    Some((saturation, value))
}

/// Map an angle in radians to a hue in `[0, 1)`.
pub fn angle_to_hue(angle: f64) -> f64 {
    let hue = (angle / TAU).rem_euclid(1.0);
    if hue >= 1.0 { 0.0 } else { hue }
}

/// Parse spin-box text leniently: the longest numeric prefix, missing digits as 0.
pub fn parse_number(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    let mut literal = s[..end].to_string();
    if literal.ends_with('.') {
        literal.push('0');
    }
    literal.parse().unwrap_or(0.0)
}
