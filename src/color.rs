//! The sampled color value and the contrast rules derived from it.

use std::fmt;
use std::str::FromStr;

use palette::{FromColor, Hsl, Hsv, Srgb};

/// Luminance above which the overlay label switches to dark text.
pub const CONTRAST_THRESHOLD: f32 = 0.7;

/// Text color used for the overlay label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTone {
    /// Dark text, for light backgrounds.
    Dark,
    /// Light text, for dark or mid-tone backgrounds.
    Light,
    /// Warning text, used only for the unsupported message.
    Alert,
}

/// Picks the label tone for a background of the given luminance.
///
/// This is a plain threshold, not a WCAG contrast computation.
pub fn tone_for_luminance(luminance: f32) -> TextTone {
    if luminance > CONTRAST_THRESHOLD {
        TextTone::Dark
    } else {
        TextTone::Light
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseColorError {
    #[error("expected 6 hex digits, got {0} characters")]
    Length(usize),
    #[error("invalid hex digit in {0:?}")]
    Digit(String),
}

/// An 8-bit sRGB color read from the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampledColor {
    r: u8,
    g: u8,
    b: u8,
}

impl SampledColor {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// The bare hex code without the leading `#`, as written to the clipboard.
    pub fn hex_digits(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Perceptual luminance (ITU-R BT.601 weights) scaled to `[0, 1]`.
    pub fn luminance(self) -> f32 {
        // weights in thousandths keep white at exactly 1.0
        let y = 299 * self.r as u32 + 587 * self.g as u32 + 114 * self.b as u32;
        y as f32 / 255_000.0
    }

    pub fn text_tone(self) -> TextTone {
        tone_for_luminance(self.luminance())
    }

    fn to_srgb(self) -> Srgb {
        Srgb::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    pub fn rgb_string(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    pub fn hsl_string(self) -> String {
        let hsl: Hsl = Hsl::from_color(self.to_srgb());
        format!(
            "hsl({:.0}, {:.0}%, {:.0}%)",
            hsl.hue.into_positive_degrees(),
            hsl.saturation * 100.0,
            hsl.lightness * 100.0
        )
    }

    pub fn hsv_string(self) -> String {
        let hsv: Hsv = Hsv::from_color(self.to_srgb());
        format!(
            "hsv({:.0}, {:.0}%, {:.0}%)",
            hsv.hue.into_positive_degrees(),
            hsv.saturation * 100.0,
            hsv.value * 100.0
        )
    }
}

/// `#RRGGBB`, upper-case.
impl fmt::Display for SampledColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Accepts exactly six hex digits in either case, with an optional leading `#`.
impl FromStr for SampledColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if digits.len() != 6 {
            return Err(ParseColorError::Length(digits.len()));
        }
        if !digits.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseColorError::Digit(digits.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ParseColorError::Digit(digits.to_string()))
        };
        Ok(Self::from_rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}
