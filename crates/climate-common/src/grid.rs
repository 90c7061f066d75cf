//! Decoded raster grids.
//!
//! Buffer layout is fixed for the whole workspace: row-major, row 0 is the
//! northernmost row, column 0 starts at the grid's first longitude.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ViewerError, ViewerResult};

/// Longitude convention of the grid's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LonConvention {
    /// Column 0 starts at 0°E, longitudes run to 360°
    #[default]
    #[serde(rename = "0-360")]
    ZeroTo360,
    /// Column 0 starts at 180°W
    #[serde(rename = "-180-180")]
    Signed180,
}

impl FromStr for LonConvention {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0-360" | "0_360" | "0..360" => Ok(LonConvention::ZeroTo360),
            "-180-180" | "-180_180" | "-180..180" => Ok(LonConvention::Signed180),
            other => Err(ViewerError::UnsupportedLonConvention(other.to_string())),
        }
    }
}

impl fmt::Display for LonConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LonConvention::ZeroTo360 => f.write_str("0-360"),
            LonConvention::Signed180 => f.write_str("-180-180"),
        }
    }
}

/// Geographic placement of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub lon_convention: LonConvention,
    /// Latitude of the top edge of row 0
    pub north: f64,
    /// Latitude of the bottom edge of the last row
    pub south: f64,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            lon_convention: LonConvention::ZeroTo360,
            north: 90.0,
            south: -90.0,
        }
    }
}

impl GridGeometry {
    pub fn new(lon_convention: LonConvention, north: f64, south: f64) -> ViewerResult<Self> {
        let geometry = Self {
            lon_convention,
            north,
            south,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> ViewerResult<()> {
        let in_range = |lat: f64| lat.is_finite() && (-90.0..=90.0).contains(&lat);
        if !in_range(self.north) || !in_range(self.south) || self.north <= self.south {
            return Err(ViewerError::InvalidLatExtent {
                north: self.north,
                south: self.south,
            });
        }
        Ok(())
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }
}

/// Flat numeric buffer in the payload's declared precision.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericBuffer {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl NumericBuffer {
    pub fn len(&self) -> usize {
        match self {
            NumericBuffer::F32(v) => v.len(),
            NumericBuffer::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at a flat index, widened to f64.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<f64> {
        match self {
            NumericBuffer::F32(v) => v.get(idx).map(|x| *x as f64),
            NumericBuffer::F64(v) => v.get(idx).copied(),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            NumericBuffer::F32(v) => Box::new(v.iter().map(|x| *x as f64)),
            NumericBuffer::F64(v) => Box::new(v.iter().copied()),
        }
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            NumericBuffer::F32(_) => "float32",
            NumericBuffer::F64(_) => "float64",
        }
    }
}

/// A decoded raster: values plus the shape and geometry they belong to.
///
/// Immutable once built. A new fetch produces a new grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGrid {
    values: NumericBuffer,
    rows: usize,
    cols: usize,
    geometry: GridGeometry,
}

impl DecodedGrid {
    /// Pair a buffer with its shape, enforcing `rows * cols == len`.
    pub fn new(
        values: NumericBuffer,
        rows: usize,
        cols: usize,
        geometry: GridGeometry,
    ) -> ViewerResult<Self> {
        if rows == 0 || cols == 0 || rows.checked_mul(cols) != Some(values.len()) {
            return Err(ViewerError::ShapeMismatch {
                rows,
                cols,
                len: values.len(),
            });
        }
        geometry.validate()?;
        Ok(Self {
            values,
            rows,
            cols,
            geometry,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn values(&self) -> &NumericBuffer {
        &self.values
    }

    /// Value at (row, col), row 0 = north.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col)
    }

    /// Cell-wise `self - other`. Non-finite where either side is non-finite.
    pub fn difference(&self, other: &DecodedGrid) -> ViewerResult<DecodedGrid> {
        self.ensure_comparable(other)?;
        let values = (0..self.values.len())
            .map(|i| {
                match (self.values.get(i), other.values.get(i)) {
                    (Some(a), Some(b)) if a.is_finite() && b.is_finite() => a - b,
                    _ => f64::NAN,
                }
            })
            .collect();
        DecodedGrid::new(NumericBuffer::F64(values), self.rows, self.cols, self.geometry)
    }

    /// Cell-wise mean of the finite members. Non-finite where no member is.
    pub fn ensemble_mean(members: &[DecodedGrid]) -> ViewerResult<DecodedGrid> {
        let first = members
            .first()
            .ok_or_else(|| ViewerError::IncompatibleGrids("empty ensemble".to_string()))?;
        for member in &members[1..] {
            first.ensure_comparable(member)?;
        }

        let len = first.values.len();
        let mut sums = vec![0.0f64; len];
        let mut counts = vec![0u32; len];
        for member in members {
            for (i, v) in member.values.iter().enumerate() {
                if v.is_finite() {
                    sums[i] += v;
                    counts[i] += 1;
                }
            }
        }

        let values = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, n)| if n == 0 { f64::NAN } else { sum / n as f64 })
            .collect();
        DecodedGrid::new(NumericBuffer::F64(values), first.rows, first.cols, first.geometry)
    }

    fn ensure_comparable(&self, other: &DecodedGrid) -> ViewerResult<()> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(ViewerError::IncompatibleGrids(format!(
                "{}x{} vs {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        if self.geometry != other.geometry {
            return Err(ViewerError::IncompatibleGrids(
                "different grid geometry".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: Vec<f64>, rows: usize, cols: usize) -> DecodedGrid {
        DecodedGrid::new(NumericBuffer::F64(values), rows, cols, GridGeometry::default()).unwrap()
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = DecodedGrid::new(
            NumericBuffer::F32(vec![1.0; 5]),
            2,
            3,
            GridGeometry::default(),
        );
        assert!(matches!(result, Err(ViewerError::ShapeMismatch { len: 5, .. })));
    }

    #[test]
    fn test_lon_convention_parse() {
        assert_eq!("0-360".parse::<LonConvention>().unwrap(), LonConvention::ZeroTo360);
        assert_eq!("-180-180".parse::<LonConvention>().unwrap(), LonConvention::Signed180);
        assert!("east".parse::<LonConvention>().is_err());
    }

    #[test]
    fn test_invalid_lat_extent() {
        assert!(GridGeometry::new(LonConvention::ZeroTo360, -60.0, 90.0).is_err());
        assert!(GridGeometry::new(LonConvention::ZeroTo360, 90.0, -60.0).is_ok());
    }

    #[test]
    fn test_difference_masks_missing_cells() {
        let a = grid(vec![5.0, f64::NAN, 3.0, 1.0], 2, 2);
        let b = grid(vec![2.0, 1.0, f64::INFINITY, 1.0], 2, 2);
        let d = a.difference(&b).unwrap();
        assert_eq!(d.value(0, 0), Some(3.0));
        assert!(d.value(0, 1).unwrap().is_nan());
        assert!(d.value(1, 0).unwrap().is_nan());
        assert_eq!(d.value(1, 1), Some(0.0));
    }

    #[test]
    fn test_difference_shape_mismatch() {
        let a = grid(vec![1.0; 4], 2, 2);
        let b = grid(vec![1.0; 6], 2, 3);
        assert!(a.difference(&b).is_err());
    }

    #[test]
    fn test_ensemble_mean_skips_non_finite() {
        let a = grid(vec![1.0, f64::NAN], 1, 2);
        let b = grid(vec![3.0, f64::NAN], 1, 2);
        let c = grid(vec![f64::NAN, f64::NAN], 1, 2);
        let mean = DecodedGrid::ensemble_mean(&[a, b, c]).unwrap();
        assert_eq!(mean.value(0, 0), Some(2.0));
        assert!(mean.value(0, 1).unwrap().is_nan());
    }
}
