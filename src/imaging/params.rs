//! Value types passed to backend operations.
//!
//! These describe *how much* of something to do, never *how* to do it. Both
//! backends interpret them identically, which keeps thumbnails from the
//! in-process and ImageMagick backends comparable.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Opacity`]: Watermark opacity as a percentage (0–100, default 100).
//! - [`Sharpening`]: Unsharp-mask parameters derived from a sharpen amount.
//! - [`Placement`]: Where a watermark lands on the main image.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Watermark opacity in percent. 0 is invisible, 100 keeps the mark's own alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opacity(pub u32);

impl Opacity {
    pub fn new(value: u32) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Multiplier applied to the mark's alpha channel.
    pub fn factor(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self(100)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Map a sharpen amount onto unsharp-mask parameters.
    ///
    /// The amount is clamped to `1..=100`; amounts below 5 sharpen as if they
    /// were 5, so a one-pixel width deficit still has a visible effect.
    /// `sigma = amount * 3 / 100`, giving a range of 0.15 to 3.0.
    pub fn from_amount(amount: u32) -> Self {
        let amount = amount.clamp(1, 100).max(5);
        Self {
            sigma: amount as f32 * 3.0 / 100.0,
            threshold: 0,
        }
    }
}

/// Watermark position on the main image.
///
/// `Center` is the default policy for both backends. `Offset` pins the mark's
/// top-left corner; negative values count from the right/bottom edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placement {
    #[default]
    Center,
    Offset { x: i64, y: i64 },
}
