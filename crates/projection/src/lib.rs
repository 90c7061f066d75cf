//! Coordinate transformations for the climate map.
//!
//! Implements the grid ↔ geographic mapping and the world screen
//! projections from scratch without external dependencies.

pub mod geographic;
pub mod screen;

pub use geographic::{grid_to_lonlat, lonlat_to_grid, normalize_lon};
pub use screen::{ScreenProjection, MERCATOR_MAX_LAT};
