//! Common types shared across the climate viewer crates.

pub mod catalog;
pub mod decode;
pub mod error;
pub mod grid;
pub mod payload;
pub mod range;
pub mod state;
pub mod units;

pub use decode::{decode, decode_grid, Dtype};
pub use error::{ViewerError, ViewerResult};
pub use grid::{DecodedGrid, GridGeometry, LonConvention, NumericBuffer};
pub use payload::{
    ChatMessage, ChatRequest, ChatResponse, DataEncoding, DataRequest, Metadata, PayloadData,
    RasterPayload, Resolution,
};
pub use range::ValueRange;
pub use state::{
    CompareSelection, ModeKind, PatchEffect, PatchError, StatePatch, ViewMode, ViewState,
};
pub use units::{DisplayUnit, UnitTransform};
