//! Pixel colors and frames.
//!
//! Channels are `f64` in the byte range so interpolation can carry fractional
//! intensities; they are clamped and truncated only when packed for the wire.

use serde::{Deserialize, Serialize};

/// One pixel. `w` is only meaningful on 4-channel (RGBW) devices.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
}

/// An ordered pixel buffer, one entry per LED.
pub type Frame = Vec<Color>;

impl Color {
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, w: None };

    #[must_use]
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, w: None }
    }

    #[must_use]
    pub const fn rgbw(r: f64, g: f64, b: f64, w: f64) -> Self {
        Self { r, g, b, w: Some(w) }
    }

    /// Linear interpolation; `t = 0` yields `self`, `t = 1` yields `other`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let w = match (self.w, other.w) {
            (None, None) => None,
            (a, b) => Some(lerp(a.unwrap_or(0.0), b.unwrap_or(0.0), t)),
        };
        Self { r: lerp(self.r, other.r, t), g: lerp(self.g, other.g, t), b: lerp(self.b, other.b, t), w }
    }

    /// Scale every channel toward black by `opacity` (`1` keeps the color).
    #[must_use]
    pub fn scaled(&self, opacity: f64) -> Self {
        Self::BLACK.lerp(self, opacity)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Convert a channel intensity to its wire byte.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn channel_byte(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0) as u8
}

/// Pixel-wise interpolation between two frames of equal length.
///
/// Extra pixels in the longer frame are ignored.
#[must_use]
pub fn lerp_frame(a: &[Color], b: &[Color], t: f64) -> Frame {
    a.iter().zip(b).map(|(ca, cb)| ca.lerp(cb, t)).collect()
}

/// Blend a frame toward black by `opacity`.
#[must_use]
pub fn fade_frame(frame: &[Color], opacity: f64) -> Frame {
    frame.iter().map(|c| c.scaled(opacity)).collect()
}

#[must_use]
pub fn black_frame(number_of_leds: usize) -> Frame {
    vec![Color::BLACK; number_of_leds]
}

#[cfg(test)]
#[path = "color_test.rs"]
mod tests;
