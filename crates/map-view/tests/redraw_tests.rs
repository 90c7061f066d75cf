//! Tests for the wrapped redraw path.

use climate_common::{DecodedGrid, GridGeometry, NumericBuffer, ValueRange};
use map_view::{draw_wrapped, tile_range, ViewportTransform};
use projection::ScreenProjection;
use renderer::{render, CachedBitmap, Palette, RenderTarget, Rgb};
use test_utils::{create_constant_grid, create_temperature_grid};
use tiny_skia::Pixmap;

const BACKGROUND: Rgb = Rgb::new(26, 26, 46);

// ============================================================================
// Helpers
// ============================================================================

/// One grid cell per world pixel: a 180x360 grid on a 360x180 world.
fn dense_bitmap(values: Vec<f32>) -> CachedBitmap {
    let grid = DecodedGrid::new(NumericBuffer::F32(values), 180, 360, GridGeometry::default())
        .unwrap();
    let range = ValueRange::of_grid(&grid).unwrap();
    let palette = Palette::by_name("grayscale").unwrap();
    let target = RenderTarget::new(360, 180, ScreenProjection::Equirectangular);
    render(&grid, &palette, &range, &target).unwrap().bitmap
}

fn frame(bitmap: &CachedBitmap, transform: &ViewportTransform) -> Pixmap {
    let mut surface = Pixmap::new(360, 180).unwrap();
    draw_wrapped(&mut surface, bitmap, transform, 1.0, BACKGROUND);
    surface
}

// ============================================================================
// Wrapping
// ============================================================================

#[test]
fn test_pan_by_one_world_width_is_identical() {
    let bitmap = dense_bitmap(create_temperature_grid(180, 360));
    for zoom in [1.0, 2.0, 4.0] {
        let a = frame(&bitmap, &ViewportTransform::new(zoom, 75.0, 0.0));
        let b = frame(&bitmap, &ViewportTransform::new(zoom, 75.0 + 360.0 * zoom, 0.0));
        let c = frame(&bitmap, &ViewportTransform::new(zoom, 75.0 - 3.0 * 360.0 * zoom, 0.0));
        assert_eq!(a.data(), b.data(), "zoom {}", zoom);
        assert_eq!(a.data(), c.data(), "zoom {}", zoom);
    }
}

#[test]
fn test_no_seam_at_fractional_pan() {
    let bitmap = dense_bitmap(create_constant_grid(180, 360, 5.0));
    for pan_x in [0.3, 137.7, -359.5, 10_000.25] {
        let surface = frame(&bitmap, &ViewportTransform::new(1.0, pan_x, 0.0));
        for (i, px) in surface.pixels().iter().enumerate() {
            assert_eq!(
                (px.red(), px.green(), px.blue(), px.alpha()),
                (128, 128, 128, 255),
                "pixel {} at pan {}",
                i,
                pan_x
            );
        }
    }
}

#[test]
fn test_zoomed_out_fills_with_copies() {
    let bitmap = dense_bitmap(create_constant_grid(180, 360, 5.0));
    let surface = frame(&bitmap, &ViewportTransform::new(0.5, 0.0, 0.0));
    // upper half holds the raster copies side by side, lower half is background
    let top = surface.pixel(300, 45).unwrap();
    let bottom = surface.pixel(300, 135).unwrap();
    assert_eq!(top.red(), 128);
    assert_eq!((bottom.red(), bottom.green(), bottom.blue()), (26, 26, 46));
}

#[test]
fn test_tile_range_covers_viewport() {
    for pan_x in [-5000.0, -1.0, 0.0, 359.0, 12345.0] {
        for zoom in [0.5, 1.0, 3.3, 10.0] {
            let t = ViewportTransform::new(zoom, pan_x, 0.0);
            let range = tile_range(&t, 360.0, 360.0);
            let (left, right) = t.visible_world_x(360.0);
            assert!((*range.start() as f64) * 360.0 <= left);
            assert!((*range.end() as f64) * 360.0 >= right);
        }
    }
}
