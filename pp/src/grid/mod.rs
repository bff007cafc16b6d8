//! Grid geometry and pixel types
//!
//! Row-major layout: `index = y * n + x`, with `x` in `[0, n)` (column) and
//! `y` in `[0, m)` (row).

mod color;
mod dims;

pub use color::{Pixel, Rgb};
pub use dims::{BatchCell, GridDimensions, InvalidDimensions, Position};

/// Grids up to this many pixels are tracked sparsely (index -> color)
pub const SPARSE_LIMIT: u64 = 784;
