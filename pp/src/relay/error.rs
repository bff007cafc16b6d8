//! Relay error types

use thiserror::Error;
use uuid::Uuid;

use crate::strategy::{FillStrategy, NoStrategy};

use super::messages::Peer;

/// Errors that can occur while running a round
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request: {0}")]
    Configuration(String),

    #[error(transparent)]
    NoStrategy(#[from] NoStrategy),

    #[error("Pixel ({x}, {y}) is outside the configured grid")]
    OutOfBounds { x: u32, y: u32 },

    #[error("Forward to {peer} failed: {message}")]
    RelayTimeout { peer: Peer, message: String },

    #[error("Progress report failed: {0}")]
    ProgressReport(String),

    #[error("Request for {actual_m}x{actual_n} does not match the configured {expected_m}x{expected_n} grid")]
    DimensionMismatch {
        expected_m: u32,
        expected_n: u32,
        actual_m: u32,
        actual_n: u32,
    },

    #[error("Payload tagged {tagged:?} but {total_pixels} pixels selects {selected:?}")]
    StrategyMismatch {
        tagged: FillStrategy,
        selected: FillStrategy,
        total_pixels: u64,
    },

    #[error("Request belongs to run {request} but the current run is {current}")]
    StaleRun { request: Uuid, current: Uuid },

    #[error("Progress authority unavailable: {0}")]
    Authority(String),
}

impl RelayError {
    /// Whether this error stops the ping-pong chain
    ///
    /// Progress reporting and bounds problems are recovered locally; every
    /// other error means no forward happened.
    pub fn is_loop_breaking(&self) -> bool {
        !matches!(self, RelayError::OutOfBounds { .. } | RelayError::ProgressReport(_))
    }

    /// Whether the request itself was at fault (as opposed to a collaborator)
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            RelayError::Configuration(_)
                | RelayError::DimensionMismatch { .. }
                | RelayError::StrategyMismatch { .. }
                | RelayError::StaleRun { .. }
        )
    }
}
