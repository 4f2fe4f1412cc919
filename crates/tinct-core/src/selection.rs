//! The color model behind one editor: the current and previous colors plus
//! the flags that decide how they are exposed.
//!
//! RGBA is stored; HSV is kept alongside so that a gray keeps its hue.
//! Mutators return the new generation when the change must be broadcast.

use crate::color::{Hsv, Hsva, Rgba, clamp_channel, scale_round};

/// Monotonic change counter.
pub type Generation = u64;

#[derive(Debug, Clone)]
pub struct Selection {
    current: Rgba,
    hsv: Hsv,
    previous: Rgba,
    current_set: bool,
    alpha_set: bool,
    has_opacity: bool,
    has_palette: bool,
    generation: Generation,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection {
    /// A fresh selection: opaque white, opacity editable, no palette.
    pub fn new() -> Self {
        Self {
            current: Rgba::WHITE,
            hsv: Rgba::WHITE.to_hsv(0.0),
            previous: Rgba::WHITE,
            current_set: false,
            alpha_set: false,
            has_opacity: true,
            has_palette: false,
            generation: 0,
        }
    }

    fn bump(&mut self) -> Generation {
        self.generation += 1;
        self.generation
    }

    fn exposed(&self, rgba: Rgba) -> Rgba {
        if self.has_opacity { rgba } else { rgba.with_alpha(1.0) }
    }

    /// Replace the current color.
    ///
    /// The first call also initialises `previous` and always emits. Later
    /// writes equal at 16-bit precision are coalesced.
    pub fn set_current_rgba(&mut self, rgba: Rgba) -> Option<Generation> {
        let rgba = rgba.clamped();
        let first = !self.current_set;

        if !first && self.alpha_set && rgba.eq_u16(&self.current) {
            return None;
        }

        if first {
            self.previous = rgba;
        } else if !self.alpha_set {
            self.previous.alpha = rgba.alpha;
        }

        self.current_set = true;
        self.alpha_set = true;
        self.hsv = rgba.to_hsv(self.hsv.hue);
        self.current = rgba;
        Some(self.bump())
    }

    /// Replace the RGB part, keeping the stored alpha.
    pub fn set_current_rgb(&mut self, red: f64, green: f64, blue: f64) -> Option<Generation> {
        let rgba = Rgba::new(red, green, blue, self.current.alpha).clamped();
        let first = !self.current_set;

        if !first && rgba.eq_u16(&self.current) {
            return None;
        }

        if first {
            self.previous = Rgba { alpha: self.previous.alpha, ..rgba };
        }

        self.current_set = true;
        self.hsv = rgba.to_hsv(self.hsv.hue);
        self.current = rgba;
        Some(self.bump())
    }

    /// Replace the current color from HSV plus alpha.
    pub fn set_current_hsva(&mut self, hsva: Hsva) -> Option<Generation> {
        let (hsv, alpha) = hsva.split();
        let hsv = hsv.clamped();
        let rgba = hsv.to_rgba(clamp_channel(alpha));
        let first = !self.current_set;

        if !first && self.alpha_set && hsv.eq_u16(&self.hsv) && rgba.eq_u16(&self.current) {
            return None;
        }

        if first {
            self.previous = rgba;
        } else if !self.alpha_set {
            self.previous.alpha = rgba.alpha;
        }

        self.current_set = true;
        self.alpha_set = true;
        self.hsv = hsv;
        self.current = rgba;
        Some(self.bump())
    }

    /// Replace hue, saturation and value, keeping the stored alpha.
    pub fn set_current_hsv(&mut self, hsv: Hsv) -> Option<Generation> {
        let hsv = hsv.clamped();
        let rgba = hsv.to_rgba(self.current.alpha);
        let first = !self.current_set;

        if !first && hsv.eq_u16(&self.hsv) && rgba.eq_u16(&self.current) {
            return None;
        }

        if first {
            self.previous = Rgba { alpha: self.previous.alpha, ..rgba };
        }

        self.current_set = true;
        self.hsv = hsv;
        self.current = rgba;
        Some(self.bump())
    }

    /// Replace only the alpha channel.
    ///
    /// The first alpha write also copies it into `previous`.
    pub fn set_current_alpha(&mut self, alpha: f64) -> Option<Generation> {
        let alpha = clamp_channel(alpha);
        let unchanged = scale_round(alpha, 65535) == scale_round(self.current.alpha, 65535);

        if self.alpha_set && unchanged {
            return None;
        }

        if !self.alpha_set {
            self.previous.alpha = alpha;
        }

        self.alpha_set = true;
        self.current.alpha = alpha;
        Some(self.bump())
    }

    /// Replace the comparison color. Never touches `current` and never emits.
    pub fn set_previous_rgba(&mut self, rgba: Rgba) {
        self.previous = rgba.clamped();
    }

    /// Replace the alpha of the comparison color.
    pub fn set_previous_alpha(&mut self, alpha: f64) {
        self.previous.alpha = clamp_channel(alpha);
    }

    /// Toggle whether alpha is editable and exposed.
    pub fn set_has_opacity(&mut self, has_opacity: bool) -> Option<Generation> {
        if self.has_opacity == has_opacity {
            return None;
        }
        self.has_opacity = has_opacity;
        Some(self.bump())
    }

    /// Toggle whether a palette view is attached.
    pub fn set_has_palette(&mut self, has_palette: bool) -> Option<Generation> {
        if self.has_palette == has_palette {
            return None;
        }
        self.has_palette = has_palette;
        Some(self.bump())
    }

    /// The current color; alpha is 1 when opacity is disabled.
    pub fn current_rgba(&self) -> Rgba {
        self.exposed(self.current)
    }

    /// The current color in HSV; alpha is 1 when opacity is disabled.
    pub fn current_hsva(&self) -> Hsva {
        let alpha = self.current_rgba().alpha;
        Hsva::new(self.hsv.hue, self.hsv.saturation, self.hsv.value, alpha)
    }

    /// The current color in HSV without alpha.
    pub fn current_hsv(&self) -> Hsv {
        self.hsv
    }

    /// The comparison color; alpha is 1 when opacity is disabled.
    pub fn previous_rgba(&self) -> Rgba {
        self.exposed(self.previous)
    }

    /// The current alpha as a 16-bit value.
    pub fn current_alpha_u16(&self) -> u16 {
        scale_round(self.current_rgba().alpha, 65535) as u16
    }

    pub fn is_current_set(&self) -> bool {
        self.current_set
    }

    pub fn is_alpha_set(&self) -> bool {
        self.alpha_set
    }

    pub fn has_opacity(&self) -> bool {
        self.has_opacity
    }

    pub fn has_palette(&self) -> bool {
        self.has_palette
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}
