//! Random single-pixel fill for sparse grids
//!
//! The image travels with the request, so each round rebuilds the set of
//! painted cells and used colors from the payload.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use rand::seq::IteratorRandom;
use tracing::{debug, warn};

use crate::grid::{GridDimensions, Pixel, Rgb};

use super::payload::{FillPayload, ProgressReport, Produced, ReportedPixel, Step, StepOutcome};

pub fn apply<R: Rng + ?Sized>(dims: GridDimensions, image: &[Pixel], rng: &mut R) -> StepOutcome {
    debug!(m = dims.m(), n = dims.n(), image_len = image.len(), "small::apply: called");

    let mut painted: BTreeMap<u64, Rgb> = BTreeMap::new();
    for pixel in image {
        if !dims.contains(pixel.x, pixel.y) {
            warn!(x = pixel.x, y = pixel.y, "small::apply: dropping out-of-bounds pixel from image");
            continue;
        }
        painted.entry(dims.index_of(pixel.x, pixel.y)).or_insert(pixel.color);
    }

    let total = dims.total_pixels();
    if painted.len() as u64 >= total {
        debug!("small::apply: image complete");
        return StepOutcome::Done;
    }

    let Some(index) = (0..total).filter(|i| !painted.contains_key(i)).choose(rng) else {
        return StepOutcome::Done;
    };
    let used: HashSet<Rgb> = painted.values().copied().collect();
    let color = Rgb::random_unused(rng, &used);
    painted.insert(index, color);

    let position = dims.position_of(index);
    let pixel = Pixel {
        x: position.x(),
        y: position.y(),
        color,
    };
    debug!(?pixel, "small::apply: painted");

    let image = painted
        .into_iter()
        .map(|(index, color)| {
            let p = dims.position_of(index);
            Pixel {
                x: p.x(),
                y: p.y(),
                color,
            }
        })
        .collect();

    StepOutcome::Step(Step {
        report: ProgressReport::Pixel {
            pixel: ReportedPixel {
                x: pixel.x,
                y: pixel.y,
                color: Some(color),
            },
        },
        forward: FillPayload::Small { image },
        produced: Produced::SmallRandom { pixel },
    })
}
