//! Fill strategies and size-based selection
//!
//! A closed set of variants; each round re-selects from `m * n` (or reads the
//! variant tag off the forwarded payload) and dispatches through
//! [`FillStrategy::apply`].
//!
//! | total pixels          | strategy |
//! |-----------------------|----------|
//! | 0 - 784               | Small    |
//! | 785 - 10,000          | Medium   |
//! | 10,001 - 20,000,000   | Large    |

mod large;
mod medium;
mod payload;
mod selector;
mod small;

use rand::Rng;

use crate::grid::{GridDimensions, Pixel};

pub use payload::{FillPayload, ProgressReport, Produced, ReportedPixel, Step, StepOutcome};
pub use selector::{FillStrategy, NoStrategy, batch_size_for, select};

/// Everything a strategy may read when applied
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    pub dims: GridDimensions,
    /// Sparse image carried by the request (small strategy only)
    pub image: &'a [Pixel],
    /// Authoritative dense-mode cursor, `None` once the grid is complete
    pub cursor: Option<u64>,
}

impl FillStrategy {
    /// Decide the next unit of work
    pub fn apply<R: Rng + ?Sized>(&self, input: StepInput<'_>, rng: &mut R) -> StepOutcome {
        match self {
            Self::Small => small::apply(input.dims, input.image, rng),
            Self::Medium => medium::apply(input.dims, input.cursor),
            Self::Large => large::apply(input.dims, input.cursor),
        }
    }

    /// Whether this strategy needs the authority's cursor
    pub fn reads_cursor(&self) -> bool {
        !matches!(self, Self::Small)
    }
}
