//! Sequential batch fill for large grids

use tracing::debug;

use crate::grid::{BatchCell, GridDimensions};

use super::payload::{FillPayload, ProgressReport, Produced, Step, StepOutcome};
use super::selector::batch_size_for;

pub fn apply(dims: GridDimensions, cursor: Option<u64>) -> StepOutcome {
    debug!(?cursor, "large::apply: called");
    let total = dims.total_pixels();
    let current_index = match cursor {
        Some(index) if index < total => index,
        _ => {
            debug!("large::apply: cursor exhausted");
            return StepOutcome::Done;
        }
    };

    let batch_size = batch_size_for(total).min(total - current_index);
    let next_index = current_index + batch_size;
    debug!(current_index, batch_size, "large::apply: building batch");

    let batch: Vec<BatchCell> = (current_index..next_index)
        .map(|index| {
            let position = dims.position_of(index);
            BatchCell {
                x: position.x(),
                y: position.y(),
                index,
            }
        })
        .collect();

    StepOutcome::Step(Step {
        report: ProgressReport::Range {
            start_index: current_index,
            end_index: next_index,
        },
        forward: FillPayload::Large {
            batch,
            batch_size,
            current_index,
        },
        produced: Produced::LargeBatchSequential {
            batch_size,
            current_index,
            next_index,
            progress_percentage: next_index as f64 / total as f64 * 100.0,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_batch_of_4m_grid() {
        let dims = GridDimensions::new(2000, 2000).unwrap();
        let StepOutcome::Step(step) = apply(dims, Some(0)) else {
            panic!("expected a step");
        };
        assert_eq!(
            step.report,
            ProgressReport::Range {
                start_index: 0,
                end_index: 1_000_000
            }
        );
        let FillPayload::Large { batch, batch_size, .. } = &step.forward else {
            panic!("expected large payload");
        };
        assert_eq!(*batch_size, 1_000_000);
        assert_eq!(batch.len(), 1_000_000);
        assert_eq!(batch[2001], BatchCell { x: 1, y: 1, index: 2001 });
    }

    #[test]
    fn test_last_batch_is_truncated() {
        let dims = GridDimensions::new(100, 150).unwrap();
        let StepOutcome::Step(step) = apply(dims, Some(10_000)) else {
            panic!("expected a step");
        };
        assert_eq!(
            step.produced,
            Produced::LargeBatchSequential {
                batch_size: 5_000,
                current_index: 10_000,
                next_index: 15_000,
                progress_percentage: 100.0,
            }
        );
    }

    #[test]
    fn test_done_at_end() {
        let dims = GridDimensions::new(100, 150).unwrap();
        assert_eq!(apply(dims, Some(15_000)), StepOutcome::Done);
        assert_eq!(apply(dims, None), StepOutcome::Done);
    }
}
