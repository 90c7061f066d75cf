//! Raster rendering for the climate map.
//!
//! - Palette catalog and interpolation
//! - Grid → cached bitmap + value lookup table
//! - Legend strip and tick formatting
//! - TrueType text drawing
//! - PNG encoding of composed frames

pub mod color;
pub mod legend;
pub mod png;
pub mod raster;
pub mod text;

pub use color::{hex_to_rgb, interpolate, Palette, Rgb};
pub use legend::{format_value, Legend, LegendTick};
pub use raster::{render, CachedBitmap, RenderTarget, RenderedRaster, ValueLookupTable};
pub use text::TextRenderer;
