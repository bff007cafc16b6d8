//! Authoritative fill progress with actor pattern
//!
//! ProgressStore owns the ProgressState and processes messages via channels,
//! so both peers' reports are serialized through a single writer.

mod bitmap;
mod manager;
mod messages;
mod state;
mod types;
mod validation;

pub use bitmap::FillBitmap;
pub use manager::{ProgressEvent, ProgressStore};
pub use messages::{ProgressCommand, ProgressError, ProgressResponse};
pub use state::{GridProgress, MAX_TRACKED_PIXELS, ProgressState};
pub use types::{ExportedImage, ProgressStatus, ReportOutcome, RunInfo};
pub use validation::{ColorValidation, validate_unique_colors};
