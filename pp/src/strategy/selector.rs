//! Size-based strategy selection

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// How a round advances the fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// One randomly placed pixel with a unique random color (sparse mode)
    Small,
    /// One pixel at the authoritative cursor (dense mode)
    Medium,
    /// A contiguous batch starting at the authoritative cursor (dense mode)
    Large,
}

/// No strategy covers this grid size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("No strategy for size {total_pixels}")]
pub struct NoStrategy {
    pub total_pixels: u64,
}

/// Inclusive pixel-count ranges, contiguous and non-overlapping
const SELECTION_TABLE: [(u64, u64, FillStrategy); 3] = [
    (0, 784, FillStrategy::Small),
    (785, 10_000, FillStrategy::Medium),
    (10_001, 20_000_000, FillStrategy::Large),
];

/// Pick the strategy for a grid of `total_pixels`
pub fn select(total_pixels: u64) -> Result<FillStrategy, NoStrategy> {
    debug!(total_pixels, "select: called");
    SELECTION_TABLE
        .iter()
        .find(|(min, max, _)| (*min..=*max).contains(&total_pixels))
        .map(|(_, _, strategy)| *strategy)
        .ok_or(NoStrategy { total_pixels })
}

/// Cells per large-strategy round for a grid of `total_pixels`
pub fn batch_size_for(total_pixels: u64) -> u64 {
    match total_pixels {
        t if t >= 10_000_000 => 2_000_000,
        t if t >= 4_000_000 => 1_000_000,
        t if t >= 1_000_000 => 500_000,
        t if t >= 100_000 => 100_000,
        _ => 50_000,
    }
}

impl FillStrategy {
    /// Name reported in round summaries
    pub fn method(&self) -> &'static str {
        match self {
            Self::Small => "small_random",
            Self::Medium => "medium_sequential",
            Self::Large => "large_batch_sequential",
        }
    }

    /// Cells painted by one round on a grid of `total_pixels`
    pub fn step_size(&self, total_pixels: u64) -> u64 {
        match self {
            Self::Small | Self::Medium => 1,
            Self::Large => batch_size_for(total_pixels),
        }
    }
}
