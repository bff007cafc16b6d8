//! Authoritative grid progress
//!
//! Plain synchronous state owned by the ProgressStore actor. All mutation
//! goes through the methods here, one command at a time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::grid::{GridDimensions, Pixel, Position, Rgb};

use super::bitmap::FillBitmap;
use super::messages::{ProgressError, ProgressResponse};
use super::types::{ExportedImage, ProgressStatus, ReportOutcome, RunInfo, percentage};

/// Largest grid the authority will allocate progress for
pub const MAX_TRACKED_PIXELS: u64 = 100_000_000;

/// Progress representation, chosen by grid size at configure time
#[derive(Debug, Clone)]
pub enum GridProgress {
    /// Filled index -> color
    Sparse(BTreeMap<u64, Rgb>),
    /// Fill bitmap plus forward cursor; every index below `cursor` is filled
    Dense { bits: FillBitmap, filled: u64, cursor: u64 },
}

impl GridProgress {
    fn for_dimensions(dims: &GridDimensions) -> Self {
        if dims.is_sparse() {
            Self::Sparse(BTreeMap::new())
        } else {
            Self::Dense {
                bits: FillBitmap::new(dims.total_pixels()),
                filled: 0,
                cursor: 0,
            }
        }
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::Sparse(_) => "sparse",
            Self::Dense { .. } => "dense",
        }
    }

    fn filled(&self) -> u64 {
        match self {
            Self::Sparse(pixels) => pixels.len() as u64,
            Self::Dense { filled, .. } => *filled,
        }
    }
}

#[derive(Debug, Clone)]
struct Run {
    id: Uuid,
    configured_at: DateTime<Utc>,
    dims: GridDimensions,
    progress: GridProgress,
}

/// Progress of the current run, if any
#[derive(Debug, Clone, Default)]
pub struct ProgressState {
    run: Option<Run>,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run, discarding any previous progress
    pub fn configure(&mut self, m: u64, n: u64) -> ProgressResponse<RunInfo> {
        debug!(m, n, "configure: called");
        let dims = GridDimensions::new(m, n)?;
        let total = dims.total_pixels();
        if total > MAX_TRACKED_PIXELS {
            debug!(total, "configure: grid too large");
            return Err(ProgressError::TooLarge {
                total,
                limit: MAX_TRACKED_PIXELS,
            });
        }

        let run = Run {
            id: Uuid::now_v7(),
            configured_at: Utc::now(),
            dims,
            progress: GridProgress::for_dimensions(&dims),
        };
        let info = RunInfo {
            run_id: run.id,
            m: dims.m(),
            n: dims.n(),
            configured_at: run.configured_at,
        };
        debug!(run_id = %run.id, mode = run.progress.mode(), "configure: new run");
        self.run = Some(run);
        Ok(info)
    }

    /// Record a single painted pixel
    ///
    /// Sparse mode stores `color` at `(x, y)`. Dense mode paints the cell under
    /// the cursor and advances it by one; `(x, y)` is only bounds-checked.
    pub fn report_pixel(&mut self, x: u32, y: u32, color: Option<Rgb>) -> ProgressResponse<ReportOutcome> {
        debug!(x, y, ?color, "report_pixel: called");
        let run = self.run.as_mut().ok_or(ProgressError::NotConfigured)?;
        let dims = run.dims;
        let total = dims.total_pixels();

        match &mut run.progress {
            GridProgress::Sparse(pixels) => {
                if pixels.len() as u64 >= total {
                    debug!("report_pixel: sparse grid already complete");
                    return Ok(ReportOutcome::Done);
                }
                if !dims.contains(x, y) {
                    debug!("report_pixel: out of bounds");
                    return Ok(ReportOutcome::OutOfBounds {
                        position: Position(x, y),
                    });
                }
                let color = color.ok_or(ProgressError::MissingColor)?;
                let index = dims.index_of(x, y);
                if pixels.contains_key(&index) {
                    debug!(index, "report_pixel: cell already filled");
                    return Ok(ReportOutcome::Duplicate {
                        position: Position(x, y),
                        index,
                    });
                }
                pixels.insert(index, color);
                Ok(ReportOutcome::Updated {
                    position: Position(x, y),
                    index,
                    next_position: None,
                    total_filled: pixels.len() as u64,
                })
            }
            GridProgress::Dense { bits, filled, cursor } => {
                if *cursor >= total {
                    debug!("report_pixel: dense grid already complete");
                    return Ok(ReportOutcome::Done);
                }
                if !dims.contains(x, y) {
                    debug!("report_pixel: out of bounds");
                    return Ok(ReportOutcome::OutOfBounds {
                        position: Position(x, y),
                    });
                }
                let index = *cursor;
                if bits.set(index) {
                    *filled += 1;
                }
                *cursor += 1;
                let next_position = (*cursor < total).then(|| dims.position_of(*cursor));
                Ok(ReportOutcome::Updated {
                    position: dims.position_of(index),
                    index,
                    next_position,
                    total_filled: *filled,
                })
            }
        }
    }

    /// Paint every unfilled cell in `[start_index, end_index)` and move the cursor to `end_index`
    ///
    /// Idempotent: cells already painted are not counted again, and the cursor
    /// never moves backwards.
    pub fn report_range(&mut self, start_index: u64, end_index: u64) -> ProgressResponse<ReportOutcome> {
        debug!(start_index, end_index, "report_range: called");
        let run = self.run.as_mut().ok_or(ProgressError::NotConfigured)?;
        let total = run.dims.total_pixels();
        let mode = run.progress.mode();

        let GridProgress::Dense { bits, filled, cursor } = &mut run.progress else {
            return Err(ProgressError::WrongMode {
                operation: "report_range",
                mode,
            });
        };

        if end_index < start_index {
            return Err(ProgressError::InvalidRange {
                start: start_index,
                end: end_index,
            });
        }
        if start_index > *cursor {
            debug!(start_index, cursor = *cursor, "report_range: range leaves a gap");
            return Err(ProgressError::RangeOutOfOrder {
                start: start_index,
                cursor: *cursor,
            });
        }

        let end = end_index.min(total);
        let mut pixels_updated = 0;
        for index in start_index..end {
            if bits.set(index) {
                pixels_updated += 1;
            }
        }
        *filled += pixels_updated;
        *cursor = (*cursor).max(end);
        debug!(pixels_updated, cursor = *cursor, "report_range: applied");

        Ok(ReportOutcome::RangeUpdated {
            start_index,
            end_index,
            pixels_updated,
            total_filled: *filled,
            total_pixels: total,
            progress_percentage: percentage(*filled, total),
        })
    }

    pub fn status(&self) -> ProgressResponse<ProgressStatus> {
        debug!("status: called");
        let run = self.run.as_ref().ok_or(ProgressError::NotConfigured)?;
        let total = run.dims.total_pixels();
        let filled = run.progress.filled();
        let done = filled >= total;

        let current_position = match &run.progress {
            GridProgress::Sparse(_) => None,
            GridProgress::Dense { cursor, .. } => (*cursor < total).then(|| run.dims.position_of(*cursor)),
        };

        Ok(ProgressStatus {
            run_id: run.id,
            m: run.dims.m(),
            n: run.dims.n(),
            colored_pixels: filled,
            total_pixels: total,
            done,
            progress_percentage: percentage(filled, total),
            current_position,
            configured_at: run.configured_at,
        })
    }

    /// Every painted cell, ordered by linear index
    ///
    /// Dense mode never records colors, so each cell gets [`Rgb::from_index`].
    pub fn export_image(&self) -> ProgressResponse<ExportedImage> {
        debug!("export_image: called");
        let run = self.run.as_ref().ok_or(ProgressError::NotConfigured)?;
        let dims = run.dims;

        let image: Vec<Pixel> = match &run.progress {
            GridProgress::Sparse(pixels) => pixels
                .iter()
                .map(|(&index, &color)| {
                    let Position(x, y) = dims.position_of(index);
                    Pixel { x, y, color }
                })
                .collect(),
            GridProgress::Dense { bits, .. } => bits
                .iter_set()
                .map(|index| {
                    let Position(x, y) = dims.position_of(index);
                    Pixel {
                        x,
                        y,
                        color: Rgb::from_index(index),
                    }
                })
                .collect(),
        };

        Ok(ExportedImage {
            colored_pixels: image.len() as u64,
            image,
            m: dims.m(),
            n: dims.n(),
            total_pixels: dims.total_pixels(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn configured(m: u64, n: u64) -> ProgressState {
        let mut state = ProgressState::new();
        state.configure(m, n).unwrap();
        state
    }

    #[test]
    fn test_operations_require_configure() {
        let mut state = ProgressState::new();
        assert!(matches!(state.status(), Err(ProgressError::NotConfigured)));
        assert!(matches!(
            state.report_pixel(0, 0, None),
            Err(ProgressError::NotConfigured)
        ));
        assert!(matches!(state.export_image(), Err(ProgressError::NotConfigured)));
    }

    #[test]
    fn test_configure_rejects_zero_dimension() {
        let mut state = ProgressState::new();
        assert!(matches!(
            state.configure(0, 3),
            Err(ProgressError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_configure_rejects_untrackable_grid() {
        let mut state = ProgressState::new();
        assert!(matches!(
            state.configure(100_000, 100_000),
            Err(ProgressError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_reconfigure_discards_progress() {
        let mut state = configured(2, 2);
        let first = state.status().unwrap().run_id;
        state.report_pixel(0, 0, Some(Rgb::new(1, 1, 1))).unwrap();

        state.configure(2, 2).unwrap();
        let status = state.status().unwrap();
        assert_eq!(status.colored_pixels, 0);
        assert_ne!(status.run_id, first);
    }

    #[test]
    fn test_sparse_report_and_done() {
        let mut state = configured(2, 2);
        let cells = [(0, 0), (1, 0), (0, 1), (1, 1)];
        for (i, (x, y)) in cells.into_iter().enumerate() {
            let outcome = state.report_pixel(x, y, Some(Rgb::new(i as u8, 0, 0))).unwrap();
            assert!(outcome.is_mutation());
            if i == 0 {
                let status = state.status().unwrap();
                assert!(!status.done);
                assert_eq!(status.current_position, None);
            }
        }

        let status = state.status().unwrap();
        assert!(status.done);
        assert_eq!(status.progress_percentage, 100.0);
        assert_eq!(status.current_position, None);

        let outcome = state.report_pixel(0, 0, Some(Rgb::new(9, 9, 9))).unwrap();
        assert_eq!(outcome, ReportOutcome::Done);
    }

    #[test]
    fn test_sparse_duplicate_and_out_of_bounds_do_not_mutate() {
        let mut state = configured(2, 3);
        state.report_pixel(2, 1, Some(Rgb::new(1, 2, 3))).unwrap();

        let dup = state.report_pixel(2, 1, Some(Rgb::new(4, 5, 6))).unwrap();
        assert_eq!(
            dup,
            ReportOutcome::Duplicate {
                position: Position(2, 1),
                index: 5
            }
        );

        let oob = state.report_pixel(3, 0, Some(Rgb::new(4, 5, 6))).unwrap();
        assert!(matches!(oob, ReportOutcome::OutOfBounds { .. }));

        let image = state.export_image().unwrap();
        assert_eq!(image.image, vec![Pixel {
            x: 2,
            y: 1,
            color: Rgb::new(1, 2, 3)
        }]);
    }

    #[test]
    fn test_sparse_requires_color() {
        let mut state = configured(2, 2);
        assert!(matches!(
            state.report_pixel(0, 0, None),
            Err(ProgressError::MissingColor)
        ));
    }

    #[test]
    fn test_sparse_rejects_range() {
        let mut state = configured(2, 2);
        assert!(matches!(
            state.report_range(0, 2),
            Err(ProgressError::WrongMode { .. })
        ));
    }

    #[test]
    fn test_dense_pixel_advances_cursor() {
        let mut state = configured(100, 100);
        let outcome = state.report_pixel(0, 0, None).unwrap();
        assert_eq!(
            outcome,
            ReportOutcome::Updated {
                position: Position(0, 0),
                index: 0,
                next_position: Some(Position(1, 0)),
                total_filled: 1,
            }
        );

        for _ in 1..100 {
            state.report_pixel(0, 0, None).unwrap();
        }
        assert_eq!(state.status().unwrap().current_position, Some(Position(0, 1)));
    }

    #[test]
    fn test_dense_pixel_wraps_to_done() {
        let mut state = configured(1, 785);
        for _ in 0..784 {
            state.report_pixel(0, 0, None).unwrap();
        }
        let last = state.report_pixel(0, 0, None).unwrap();
        assert!(matches!(last, ReportOutcome::Updated { next_position: None, .. }));
        assert!(state.status().unwrap().done);
        assert_eq!(state.report_pixel(0, 0, None).unwrap(), ReportOutcome::Done);
    }

    #[test]
    fn test_dense_out_of_bounds_does_not_advance() {
        let mut state = configured(30, 30);
        let outcome = state.report_pixel(30, 0, None).unwrap();
        assert!(matches!(outcome, ReportOutcome::OutOfBounds { .. }));
        assert_eq!(state.status().unwrap().current_position, Some(Position(0, 0)));
    }

    #[test]
    fn test_range_moves_cursor_to_end() {
        let mut state = configured(2000, 2000);
        state.report_range(0, 1_000_000).unwrap();
        let status = state.status().unwrap();
        assert_eq!(status.current_position, Some(Position(0, 500)));
        assert_eq!(status.colored_pixels, 1_000_000);
    }

    #[test]
    fn test_range_is_idempotent() {
        let mut state = configured(100, 200);
        state.report_range(0, 5_000).unwrap();
        let outcome = state.report_range(0, 5_000).unwrap();
        assert!(matches!(outcome, ReportOutcome::RangeUpdated { pixels_updated: 0, .. }));

        let outcome = state.report_range(4_000, 6_000).unwrap();
        assert!(matches!(
            outcome,
            ReportOutcome::RangeUpdated {
                pixels_updated: 1_000,
                total_filled: 6_000,
                ..
            }
        ));
    }

    #[test]
    fn test_range_rejects_gap_and_inverted_bounds() {
        let mut state = configured(100, 200);
        assert!(matches!(
            state.report_range(10, 20),
            Err(ProgressError::RangeOutOfOrder { start: 10, cursor: 0 })
        ));
        assert!(matches!(
            state.report_range(0, 0).map(|o| o.is_mutation()),
            Ok(true)
        ));
        state.report_range(0, 50).unwrap();
        assert!(matches!(
            state.report_range(40, 30),
            Err(ProgressError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_range_clamps_to_grid() {
        let mut state = configured(100, 200);
        let outcome = state.report_range(19_000, 25_000);
        assert!(outcome.is_err());

        state.report_range(0, 25_000).unwrap();
        let status = state.status().unwrap();
        assert!(status.done);
        assert_eq!(status.colored_pixels, 20_000);
        assert_eq!(status.current_position, None);
    }

    #[test]
    fn test_dense_export_synthesizes_colors() {
        let mut state = configured(10, 100);
        state.report_range(0, 300).unwrap();
        let image = state.export_image().unwrap();
        assert_eq!(image.colored_pixels, 300);
        assert_eq!(image.image[257], Pixel {
            x: 57,
            y: 2,
            color: Rgb::new(0, 1, 1)
        });
    }

    proptest! {
        #[test]
        fn prop_range_reports_never_double_count(
            ends in proptest::collection::vec(0u64..12_000, 1..20)
        ) {
            let mut state = configured(100, 100);
            let mut last_cursor = 0;
            for end in ends {
                let start = state.status().unwrap().cursor_index().unwrap_or(10_000).saturating_sub(end % 500);
                let _ = state.report_range(start, end);
                let status = state.status().unwrap();
                let cursor = status.cursor_index().unwrap_or(status.total_pixels);
                prop_assert!(cursor >= last_cursor);
                prop_assert_eq!(status.colored_pixels, cursor);
                last_cursor = cursor;
            }
        }
    }
}
