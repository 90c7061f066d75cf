//! Error types for the climate viewer.

use thiserror::Error;

/// Result type alias using ViewerError.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Primary error type for decode, render and configuration failures.
#[derive(Debug, Error)]
pub enum ViewerError {
    // === Decode Errors ===
    #[error("Unsupported dtype: {0}")]
    UnsupportedDtype(String),

    #[error("Unsupported longitude convention: {0}")]
    UnsupportedLonConvention(String),

    #[error("Grid shape {rows}x{cols} does not match {len} decoded values")]
    ShapeMismatch { rows: usize, cols: usize, len: usize },

    #[error("Invalid latitude extent: north={north}, south={south}")]
    InvalidLatExtent { north: f64, south: f64 },

    // === Data Errors ===
    #[error("Dataset contains no valid numeric values")]
    NoValidValues,

    #[error("Grids are not comparable: {0}")]
    IncompatibleGrids(String),

    // === Rendering Errors ===
    #[error("Unknown palette: {0}")]
    UnknownPalette(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Rendering failed: {0}")]
    RenderError(String),

    #[error("Projection error: {0}")]
    ProjectionError(String),

    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ViewerError {
    /// Message shown to the user in the error overlay.
    pub fn user_message(&self) -> String {
        match self {
            ViewerError::NoValidValues => "No valid numeric values in this dataset".to_string(),
            ViewerError::UnsupportedDtype(_)
            | ViewerError::UnsupportedLonConvention(_)
            | ViewerError::ShapeMismatch { .. }
            | ViewerError::InvalidLatExtent { .. } => format!("Data error: {}", self),
            _ => self.to_string(),
        }
    }

    /// Degenerate data is reported, not treated as a crash of the load cycle.
    pub fn is_degenerate_data(&self) -> bool {
        matches!(self, ViewerError::NoValidValues)
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::InvalidConfig(format!("JSON error: {}", err))
    }
}
