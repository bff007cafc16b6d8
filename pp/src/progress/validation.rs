//! Color uniqueness check over an exported image

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{Pixel, Rgb};

/// Result of [`validate_unique_colors`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorValidation {
    pub is_valid: bool,
    pub total_pixels: u64,
    /// Colors shared by more than one pixel, ascending
    pub duplicate_colors: Vec<Rgb>,
}

/// Check that no two pixels share a color
pub fn validate_unique_colors(pixels: &[Pixel]) -> ColorValidation {
    debug!(len = pixels.len(), "validate_unique_colors: called");
    let mut counts: BTreeMap<Rgb, u64> = BTreeMap::new();
    for pixel in pixels {
        *counts.entry(pixel.color).or_default() += 1;
    }

    let duplicate_colors: Vec<Rgb> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(color, _)| color)
        .collect();

    ColorValidation {
        is_valid: duplicate_colors.is_empty(),
        total_pixels: pixels.len() as u64,
        duplicate_colors,
    }
}
