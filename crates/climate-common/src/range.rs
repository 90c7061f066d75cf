//! Value range of a decoded grid.

use serde::{Deserialize, Serialize};

use crate::error::{ViewerError, ViewerResult};
use crate::grid::DecodedGrid;

/// Closed value range `[min, max]` over the finite cells of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Scan values, ignoring non-finite cells.
    ///
    /// Fails with [`ViewerError::NoValidValues`] when no cell is finite.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> ViewerResult<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut seen = false;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
            seen = true;
        }
        if !seen {
            return Err(ViewerError::NoValidValues);
        }
        Ok(Self { min, max })
    }

    pub fn of_grid(grid: &DecodedGrid) -> ViewerResult<Self> {
        Self::from_values(grid.values().iter())
    }

    /// Symmetric range `[-m, m]` around zero, used for difference fields.
    pub fn symmetric(&self) -> Self {
        let m = self.min.abs().max(self.max.abs());
        Self { min: -m, max: m }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// A flat field: every finite cell has the same value.
    pub fn is_degenerate(&self) -> bool {
        self.span() == 0.0
    }

    /// Position of `value` within the range, clamped to [0, 1].
    ///
    /// A degenerate range maps every value to 0.5.
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.5;
        }
        ((value - self.min) / self.span()).clamp(0.0, 1.0)
    }

    /// Value at a fraction of the range.
    pub fn lerp(&self, t: f64) -> f64 {
        self.min + self.span() * t
    }
}
