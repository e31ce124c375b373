//! Color patterns — palette table, lookup, and the animated frame source.
//!
//! A pattern phase spreads a palette across the strip. The animation walks one
//! palette stop per step and cross-fades between consecutive phases, so the
//! colors drift smoothly along the LEDs over time.

use std::time::Duration;

use crate::color::{Color, Frame, lerp_frame};

/// Something that produces a fresh frame for a given elapsed time.
pub trait FrameSource: Send {
    fn frame(&mut self, number_of_leds: usize, elapsed: Duration) -> Frame;
}

// =============================================================================
// PALETTES
// =============================================================================

/// A named cyclic color gradient.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub name: &'static str,
    pub stops: &'static [Color],
}

pub const PALETTES: &[Palette] = &[
    Palette {
        name: "aurora",
        stops: &[
            Color::rgb(0.0, 255.0, 120.0),
            Color::rgb(0.0, 120.0, 255.0),
            Color::rgb(140.0, 0.0, 255.0),
            Color::rgb(0.0, 200.0, 180.0),
        ],
    },
    Palette {
        name: "ember",
        stops: &[
            Color::rgb(255.0, 40.0, 0.0),
            Color::rgb(255.0, 140.0, 0.0),
            Color::rgb(180.0, 0.0, 0.0),
            Color::rgb(255.0, 90.0, 10.0),
        ],
    },
    Palette {
        name: "candy",
        stops: &[
            Color::rgb(255.0, 0.0, 0.0),
            Color::rgb(255.0, 255.0, 255.0),
            Color::rgb(255.0, 0.0, 0.0),
            Color::rgb(0.0, 160.0, 0.0),
        ],
    },
    Palette {
        name: "warm-white",
        stops: &[Color::rgbw(0.0, 0.0, 0.0, 255.0), Color::rgbw(40.0, 20.0, 0.0, 200.0)],
    },
];

/// Find a palette by name (case-insensitive).
#[must_use]
pub fn find_palette(name: &str) -> Option<&'static Palette> {
    PALETTES
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

/// Sample a cyclic gradient at `position`, wrapping into `[0, 1)`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn lookup(stops: &[Color], position: f64) -> Color {
    match stops.len() {
        0 => Color::BLACK,
        1 => stops[0],
        len => {
            let scaled = position.rem_euclid(1.0) * len as f64;
            let index = (scaled.floor() as usize).min(len - 1);
            let frac = scaled - scaled.floor();
            stops[index].lerp(&stops[(index + 1) % len], frac)
        }
    }
}

// =============================================================================
// ANIMATED SOURCE
// =============================================================================

/// Palette animation advancing one stop per `step`.
pub struct PatternSource {
    palette: &'static Palette,
    step: Duration,
}

impl PatternSource {
    #[must_use]
    pub fn new(palette: &'static Palette, step: Duration) -> Self {
        Self { palette, step: step.max(Duration::from_millis(1)) }
    }

    #[must_use]
    pub fn palette_name(&self) -> &'static str {
        self.palette.name
    }

    #[allow(clippy::cast_precision_loss)]
    fn phase_frame(&self, number_of_leds: usize, phase: f64) -> Frame {
        let stops = self.palette.stops;
        let offset = phase / stops.len().max(1) as f64;
        (0..number_of_leds)
            .map(|i| lookup(stops, i as f64 / number_of_leds as f64 + offset))
            .collect()
    }
}

impl FrameSource for PatternSource {
    fn frame(&mut self, number_of_leds: usize, elapsed: Duration) -> Frame {
        let steps = elapsed.as_secs_f64() / self.step.as_secs_f64();
        let phase = steps.floor();
        let from = self.phase_frame(number_of_leds, phase);
        let to = self.phase_frame(number_of_leds, phase + 1.0);
        lerp_frame(&from, &to, steps - phase)
    }
}

#[cfg(test)]
#[path = "pattern_test.rs"]
mod tests;
