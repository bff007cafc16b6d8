//! Sequential single-pixel fill
//!
//! Paints the cell under the authoritative cursor. The authority advances
//! the cursor when it receives the report; this side never moves it.

use tracing::debug;

use crate::grid::GridDimensions;

use super::payload::{FillPayload, ProgressReport, Produced, ReportedPixel, Step, StepOutcome};

pub fn apply(dims: GridDimensions, cursor: Option<u64>) -> StepOutcome {
    debug!(?cursor, "medium::apply: called");
    let index = match cursor {
        Some(index) if index < dims.total_pixels() => index,
        _ => {
            debug!("medium::apply: cursor exhausted");
            return StepOutcome::Done;
        }
    };

    let position = dims.position_of(index);
    StepOutcome::Step(Step {
        report: ProgressReport::Pixel {
            pixel: ReportedPixel {
                x: position.x(),
                y: position.y(),
                color: None,
            },
        },
        forward: FillPayload::Medium { position, index },
        produced: Produced::MediumSequential { position, index },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;

    #[test]
    fn test_paints_cursor_cell() {
        let dims = GridDimensions::new(100, 100).unwrap();
        let StepOutcome::Step(step) = apply(dims, Some(205)) else {
            panic!("expected a step");
        };
        assert_eq!(
            step.forward,
            FillPayload::Medium {
                position: Position(5, 2),
                index: 205
            }
        );
        assert!(matches!(
            step.report,
            ProgressReport::Pixel {
                pixel: ReportedPixel {
                    x: 5,
                    y: 2,
                    color: None
                }
            }
        ));
    }

    #[test]
    fn test_done_without_cursor() {
        let dims = GridDimensions::new(100, 100).unwrap();
        assert_eq!(apply(dims, None), StepOutcome::Done);
        assert_eq!(apply(dims, Some(10_000)), StepOutcome::Done);
    }
}
