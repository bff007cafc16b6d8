//! RGB colors and painted pixels

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 24-bit color, serialized as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Deterministic stand-in color for a dense-mode cell
    ///
    /// The channels are the base-256 digits of the linear index, so distinct
    /// indices below 2^24 never share a color. No real color is recorded in
    /// dense mode; this exists for presentation only.
    pub fn from_index(index: u64) -> Self {
        Self([
            ((index >> 16) & 0xFF) as u8,
            ((index >> 8) & 0xFF) as u8,
            (index & 0xFF) as u8,
        ])
    }

    /// Draw a uniformly random color not present in `used`
    ///
    /// Rejection sampling: cheap while the 2^24 color space is mostly free,
    /// slower as it fills. Callers bound `used` well below 2^24.
    pub fn random_unused<R: Rng + ?Sized>(rng: &mut R, used: &HashSet<Rgb>) -> Self {
        loop {
            let color = Self(rng.random());
            if !used.contains(&color) {
                return color;
            }
        }
    }
}

/// A painted cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
    pub color: Rgb,
}
