//! Grid dimensions and coordinate conversion

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SPARSE_LIMIT;

/// Rejected grid dimensions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid grid dimensions {m}x{n}: m and n must both be at least 1")]
pub struct InvalidDimensions {
    pub m: u64,
    pub n: u64,
}

/// Dimensions of a run: `m` rows by `n` columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    m: u32,
    n: u32,
}

impl GridDimensions {
    /// Validate and build dimensions
    pub fn new(m: u64, n: u64) -> Result<Self, InvalidDimensions> {
        if m < 1 || n < 1 || m > u64::from(u32::MAX) || n > u64::from(u32::MAX) {
            return Err(InvalidDimensions { m, n });
        }
        Ok(Self {
            m: m as u32,
            n: n as u32,
        })
    }

    /// Number of rows
    pub fn m(&self) -> u32 {
        self.m
    }

    /// Number of columns
    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn total_pixels(&self) -> u64 {
        u64::from(self.m) * u64::from(self.n)
    }

    /// Whether progress for this grid is kept as an index -> color map
    pub fn is_sparse(&self) -> bool {
        self.total_pixels() <= SPARSE_LIMIT
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.n && y < self.m
    }

    pub fn index_of(&self, x: u32, y: u32) -> u64 {
        u64::from(y) * u64::from(self.n) + u64::from(x)
    }

    /// Convert a linear index back to `(x, y)`
    ///
    /// Indices at or past `total_pixels` map to rows beyond the grid; callers
    /// check bounds with [`GridDimensions::contains`] when it matters.
    pub fn position_of(&self, index: u64) -> Position {
        let n = u64::from(self.n);
        Position((index % n) as u32, (index / n) as u32)
    }
}

/// A cell coordinate, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position(pub u32, pub u32);

impl Position {
    pub fn x(&self) -> u32 {
        self.0
    }

    pub fn y(&self) -> u32 {
        self.1
    }
}

/// One cell of a large-strategy batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCell {
    pub x: u32,
    pub y: u32,
    pub index: u64,
}
