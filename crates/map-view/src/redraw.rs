//! Wrapped redraw: blit the cached bitmap at every horizontal tile offset.
//!
//! This path never touches grid values, colors or projections. It is a pure
//! image blit of the cached bitmap under the current transform.

use std::ops::RangeInclusive;

use renderer::{CachedBitmap, Rgb};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::transform::ViewportTransform;

/// Extra screen pixels each tile is stretched by to hide seams.
pub const SEAM_OVERLAP_PX: f64 = 0.5;

/// Tile indices covering the visible span, with one spare tile on each side.
pub fn tile_range(
    transform: &ViewportTransform,
    world_width: f64,
    view_width: f64,
) -> RangeInclusive<i64> {
    let (left, right) = transform.visible_world_x(view_width);
    let first = (left / world_width).floor() as i64 - 1;
    let last = (right / world_width).ceil() as i64 + 1;
    first..=last
}

/// Screen transform (device pixels) that places tile `i` of the bitmap.
pub fn tile_transform(
    transform: &ViewportTransform,
    tile: i64,
    world_width: f64,
    dpr: f64,
) -> Transform {
    let zoom = transform.zoom;
    let scale_x = (world_width * zoom + SEAM_OVERLAP_PX) / world_width;
    let origin_x = tile as f64 * world_width * zoom - transform.pan_x;
    let origin_y = -transform.pan_y;
    Transform::from_row(
        (scale_x * dpr) as f32,
        0.0,
        0.0,
        (zoom * dpr) as f32,
        (origin_x * dpr) as f32,
        (origin_y * dpr) as f32,
    )
}

/// Clear `surface` to `background` and blit the bitmap across the viewport.
///
/// `surface` is in device pixels; its CSS width is `surface.width() / dpr`.
pub fn draw_wrapped(
    surface: &mut Pixmap,
    bitmap: &CachedBitmap,
    transform: &ViewportTransform,
    dpr: f64,
    background: Rgb,
) -> usize {
    surface.fill(background.to_color());

    let world_width = bitmap.width() as f64;
    let view_width = surface.width() as f64 / dpr;
    let paint = PixmapPaint {
        quality: FilterQuality::Nearest,
        ..PixmapPaint::default()
    };

    let mut tiles = 0;
    for tile in tile_range(transform, world_width, view_width) {
        let t = tile_transform(transform, tile, world_width, dpr);
        surface.draw_pixmap(0, 0, bitmap.pixmap().as_ref(), &paint, t, None);
        tiles += 1;
    }
    tiles
}
