//! Values returned by the progress authority
//!
//! These are also the JSON bodies of the authority's HTTP endpoints, so the
//! remote client deserializes exactly what the local store produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grid::{GridDimensions, Pixel, Position};

/// Identity of the current run, returned by `configure`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub m: u32,
    pub n: u32,
    pub configured_at: DateTime<Utc>,
}

/// Result of a pixel or range report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome {
    /// One cell was painted
    Updated {
        position: Position,
        index: u64,
        /// Dense-mode cursor after the update, `None` once the grid is complete
        next_position: Option<Position>,
        total_filled: u64,
    },
    /// A contiguous range was painted
    RangeUpdated {
        start_index: u64,
        end_index: u64,
        /// Cells newly painted by this report, not the width of the range
        pixels_updated: u64,
        total_filled: u64,
        total_pixels: u64,
        progress_percentage: f64,
    },
    /// The cell was already painted; nothing changed
    Duplicate { position: Position, index: u64 },
    /// The cell lies outside the grid; nothing changed
    OutOfBounds { position: Position },
    /// The grid is complete; nothing changed
    Done,
}

impl ReportOutcome {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Updated { .. } | Self::RangeUpdated { .. })
    }
}

/// Snapshot of the current run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStatus {
    pub run_id: Uuid,
    pub m: u32,
    pub n: u32,
    pub colored_pixels: u64,
    pub total_pixels: u64,
    pub done: bool,
    pub progress_percentage: f64,
    /// Dense-mode cursor; `None` once done.
    ///
    /// Sparse runs paint cells in random order and have no cursor, so this is
    /// `None` for the whole run, not just at the end.
    pub current_position: Option<Position>,
    pub configured_at: DateTime<Utc>,
}

impl ProgressStatus {
    pub fn matches(&self, dims: &GridDimensions) -> bool {
        self.m == dims.m() && self.n == dims.n()
    }

    /// Linear index of the dense-mode cursor
    pub fn cursor_index(&self) -> Option<u64> {
        self.current_position
            .map(|Position(x, y)| u64::from(y) * u64::from(self.n) + u64::from(x))
    }
}

/// All painted cells of the current run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedImage {
    pub image: Vec<Pixel>,
    pub m: u32,
    pub n: u32,
    pub colored_pixels: u64,
    pub total_pixels: u64,
}

pub(crate) fn percentage(filled: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    filled as f64 / total as f64 * 100.0
}
