//! Progress store messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::grid::{InvalidDimensions, Rgb};

use super::types::{ExportedImage, ProgressStatus, ReportOutcome, RunInfo};

/// Errors from progress operations
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Grid is not configured")]
    NotConfigured,

    #[error(transparent)]
    InvalidDimensions(#[from] InvalidDimensions),

    #[error("Grid of {total} pixels exceeds the tracking limit of {limit}")]
    TooLarge { total: u64, limit: u64 },

    #[error("{operation} is not supported in {mode} mode")]
    WrongMode { operation: &'static str, mode: &'static str },

    #[error("Sparse-mode pixel reports must carry a color")]
    MissingColor,

    #[error("Invalid range [{start}, {end})")]
    InvalidRange { start: u64, end: u64 },

    #[error("Range starting at {start} skips unfilled cells after cursor {cursor}")]
    RangeOutOfOrder { start: u64, cursor: u64 },

    #[error("Dimensions {actual_m}x{actual_n} do not match configured grid {expected_m}x{expected_n}")]
    DimensionMismatch {
        expected_m: u32,
        expected_n: u32,
        actual_m: u32,
        actual_n: u32,
    },

    #[error("Channel error")]
    ChannelError,
}

/// Response from progress operations
pub type ProgressResponse<T> = Result<T, ProgressError>;

/// Commands sent to the ProgressStore actor
#[derive(Debug)]
pub enum ProgressCommand {
    Configure {
        m: u64,
        n: u64,
        reply: oneshot::Sender<ProgressResponse<RunInfo>>,
    },
    ReportPixel {
        x: u32,
        y: u32,
        color: Option<Rgb>,
        reply: oneshot::Sender<ProgressResponse<ReportOutcome>>,
    },
    ReportRange {
        start_index: u64,
        end_index: u64,
        reply: oneshot::Sender<ProgressResponse<ReportOutcome>>,
    },
    Status {
        reply: oneshot::Sender<ProgressResponse<ProgressStatus>>,
    },
    ExportImage {
        reply: oneshot::Sender<ProgressResponse<ExportedImage>>,
    },

    // Shutdown
    Shutdown,
}
