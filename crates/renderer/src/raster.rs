//! Raster → cached bitmap rendering.
//!
//! A full render walks every grid cell once, projects it, colors it and
//! writes a filled square straight into the RGBA buffer. The matching
//! [`ValueLookupTable`] records the native value behind every touched pixel
//! so pointer lookups never need the grid again.

use std::time::Instant;

use climate_common::{DecodedGrid, ValueRange, ViewerError, ViewerResult};
use projection::{grid_to_lonlat, ScreenProjection};
use tiny_skia::Pixmap;
use tracing::debug;

use crate::color::Palette;

/// Fraction of the cell pitch covered by each painted square.
pub const CELL_FILL: f64 = 0.8;

/// World size and projection of a full render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    /// World width in CSS pixels at zoom 1
    pub width: u32,
    /// World height in CSS pixels at zoom 1
    pub height: u32,
    pub projection: ScreenProjection,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32, projection: ScreenProjection) -> Self {
        Self {
            width,
            height,
            projection,
        }
    }
}

/// The off-screen image produced by a full render.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedBitmap {
    pixmap: Pixmap,
}

impl CachedBitmap {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Premultiplied RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// RGBA of a pixel, `None` outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let p = self.pixmap.pixel(x, y)?;
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }
}

/// Native value behind each bitmap pixel; NaN where nothing was painted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueLookupTable {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl ValueLookupTable {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![f64::NAN; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Value at integer pixel (x, y). Out of bounds and unpainted pixels are `None`.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<f64> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        let value = self.values[y as usize * self.width + x as usize];
        value.is_finite().then_some(value)
    }

    /// Number of pixels holding a value.
    pub fn painted(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }
}

/// Counters of one full render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub cells_painted: usize,
    pub cells_skipped: usize,
}

/// Bitmap and lookup table built together by one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRaster {
    pub bitmap: CachedBitmap,
    pub lookup: ValueLookupTable,
    pub stats: RenderStats,
}

/// Render a decoded grid into a fresh bitmap and lookup table.
///
/// Non-finite cells are skipped. Where painted squares overlap, the cell
/// visited later (row-major) wins. Nothing shared is touched, so the
/// caller can swap the result in atomically.
pub fn render(
    grid: &DecodedGrid,
    palette: &Palette,
    range: &ValueRange,
    target: &RenderTarget,
) -> ViewerResult<RenderedRaster> {
    let start = Instant::now();
    let mut pixmap = Pixmap::new(target.width, target.height).ok_or_else(|| {
        ViewerError::RenderError(format!(
            "invalid bitmap size {}x{}",
            target.width, target.height
        ))
    })?;

    let width = target.width as usize;
    let height = target.height as usize;
    let world_w = target.width as f64;
    let world_h = target.height as f64;
    let (rows, cols) = (grid.rows(), grid.cols());
    let geometry = grid.geometry();

    let side = (world_w / cols as f64).max(world_h / rows as f64) * CELL_FILL;
    let half = side / 2.0;

    let mut lookup = ValueLookupTable::new(width, height);
    let mut stats = RenderStats::default();
    let data = pixmap.data_mut();
    let values = grid.values();

    for y in 0..rows {
        for x in 0..cols {
            let value = match values.get(y * cols + x) {
                Some(v) if v.is_finite() => v,
                _ => {
                    stats.cells_skipped += 1;
                    continue;
                }
            };

            let (lon, lat) = grid_to_lonlat(x, y, cols, rows, geometry);
            let (px, py) = target.projection.project(lon, lat, world_w, world_h);
            let color = palette.at(range.normalize(value));

            let x0 = (px - half).floor();
            let x1 = (x0 + 1.0).max((px + half).ceil());
            let y0 = (py - half).floor();
            let y1 = (y0 + 1.0).max((py + half).ceil());

            let x_start = x0.max(0.0) as usize;
            let x_end = (x1.min(world_w).max(0.0)) as usize;
            let y_start = y0.max(0.0) as usize;
            let y_end = (y1.min(world_h).max(0.0)) as usize;

            for row in y_start..y_end {
                for col in x_start..x_end {
                    let idx = row * width + col;
                    let offset = idx * 4;
                    data[offset] = color.r;
                    data[offset + 1] = color.g;
                    data[offset + 2] = color.b;
                    data[offset + 3] = 255;
                    lookup.values[idx] = value;
                }
            }
            stats.cells_painted += 1;
        }
    }

    debug!(
        rows,
        cols,
        width,
        height,
        painted = stats.cells_painted,
        skipped = stats.cells_skipped,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Rendered raster bitmap"
    );

    Ok(RenderedRaster {
        bitmap: CachedBitmap { pixmap },
        lookup,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use climate_common::{GridGeometry, NumericBuffer};

    fn grid(values: Vec<f32>, rows: usize, cols: usize) -> DecodedGrid {
        DecodedGrid::new(NumericBuffer::F32(values), rows, cols, GridGeometry::default()).unwrap()
    }

    #[test]
    fn test_zero_size_target_is_error() {
        let g = grid(vec![1.0], 1, 1);
        let palette = Palette::by_name("grayscale").unwrap();
        let target = RenderTarget::new(0, 10, ScreenProjection::Equirectangular);
        assert!(render(&g, &palette, &ValueRange::new(0.0, 1.0), &target).is_err());
    }

    #[test]
    fn test_missing_cells_are_skipped() {
        let g = grid(vec![1.0, f32::NAN, 2.0, f32::INFINITY], 2, 2);
        let palette = Palette::by_name("grayscale").unwrap();
        let target = RenderTarget::new(4, 2, ScreenProjection::Equirectangular);
        let out = render(&g, &palette, &ValueRange::new(1.0, 2.0), &target).unwrap();
        assert_eq!(out.stats.cells_painted, 2);
        assert_eq!(out.stats.cells_skipped, 2);
    }

    #[test]
    fn test_lookup_out_of_bounds() {
        let table = ValueLookupTable::new(3, 2);
        assert_eq!(table.get(-1, 0), None);
        assert_eq!(table.get(3, 0), None);
        assert_eq!(table.get(0, 0), None); // unpainted
    }
}
