//! What a strategy hands back to the relay: the forward payload for the
//! opposite peer, the delta for the progress authority, and a summary for
//! the caller.

use serde::{Deserialize, Serialize};

use crate::grid::{BatchCell, Pixel, Position, Rgb};

use super::selector::FillStrategy;

/// Strategy-specific state carried from one peer to the other
///
/// Tagged with its strategy so the receiving peer does not have to re-derive
/// the variant from `m * n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FillPayload {
    Small {
        image: Vec<Pixel>,
    },
    Medium {
        position: Position,
        index: u64,
    },
    Large {
        batch: Vec<BatchCell>,
        batch_size: u64,
        current_index: u64,
    },
}

impl FillPayload {
    pub fn strategy(&self) -> FillStrategy {
        match self {
            Self::Small { .. } => FillStrategy::Small,
            Self::Medium { .. } => FillStrategy::Medium,
            Self::Large { .. } => FillStrategy::Large,
        }
    }
}

/// Pixel sent to the authority; color is only meaningful in sparse mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedPixel {
    pub x: u32,
    pub y: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
}

/// Delta reported to the progress authority
///
/// Serialized as the body of `POST /status/update_pixel/`: either
/// `{"pixel": {...}}` or `{"start_index": a, "end_index": b}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressReport {
    Range { start_index: u64, end_index: u64 },
    Pixel { pixel: ReportedPixel },
}

/// What one round produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Produced {
    SmallRandom {
        pixel: Pixel,
    },
    MediumSequential {
        position: Position,
        index: u64,
    },
    LargeBatchSequential {
        batch_size: u64,
        current_index: u64,
        next_index: u64,
        progress_percentage: f64,
    },
}

/// A round's work, ready to report and forward
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub report: ProgressReport,
    pub forward: FillPayload,
    pub produced: Produced,
}

/// Result of applying a strategy
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Nothing left to paint; no mutation, nothing to forward
    Done,
    Step(Step),
}
