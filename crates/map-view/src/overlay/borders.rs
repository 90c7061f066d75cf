//! Border polylines: antimeridian-safe projection and wrapped stroking.

use projection::ScreenProjection;
use renderer::Rgb;
use serde::{Deserialize, Serialize};
use tiny_skia::{Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::redraw::tile_range;
use crate::transform::ViewportTransform;

/// A set of border polylines, each a list of `[lon, lat]` vertices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorderSet {
    pub polylines: Vec<Vec<[f64; 2]>>,
}

impl BorderSet {
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn len(&self) -> usize {
        self.polylines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }
}

/// Project a polyline into world pixels, splitting it where consecutive
/// vertices jump by more than half the world width (an antimeridian crossing).
pub fn project_polyline(
    polyline: &[[f64; 2]],
    projection: ScreenProjection,
    world_width: f64,
    world_height: f64,
) -> Vec<Vec<(f64, f64)>> {
    let mut parts: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for &[lon, lat] in polyline {
        if !(lon.is_finite() && lat.is_finite()) {
            continue;
        }
        let point = projection.project(lon, lat, world_width, world_height);
        if let Some(&(prev_x, _)) = current.last() {
            if (point.0 - prev_x).abs() > world_width / 2.0 {
                parts.push(std::mem::take(&mut current));
            }
        }
        current.push(point);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts.retain(|p| p.len() >= 2);
    parts
}

/// Stroke style of the border layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderStyle {
    pub color: Rgb,
    /// Line width in CSS pixels, constant across zoom levels
    pub width: f32,
}

/// Stroke every polyline at every tile offset covering the viewport.
///
/// Returns the number of subpaths stroked.
pub fn draw_borders(
    surface: &mut Pixmap,
    borders: &BorderSet,
    projection: ScreenProjection,
    transform: &ViewportTransform,
    world: (f64, f64),
    dpr: f64,
    style: BorderStyle,
) -> usize {
    let (world_width, world_height) = world;
    let view_width = surface.width() as f64 / dpr;

    let projected: Vec<Vec<(f64, f64)>> = borders
        .polylines
        .iter()
        .flat_map(|line| project_polyline(line, projection, world_width, world_height))
        .collect();
    if projected.is_empty() {
        return 0;
    }

    // One path in world coordinates, stroked once per tile.
    let mut pb = PathBuilder::new();
    for part in &projected {
        let (x0, y0) = part[0];
        pb.move_to(x0 as f32, y0 as f32);
        for &(x, y) in &part[1..] {
            pb.line_to(x as f32, y as f32);
        }
    }
    let Some(path) = pb.finish() else {
        return 0;
    };

    let mut paint = Paint::default();
    paint.set_color(style.color.to_color());
    paint.anti_alias = true;

    let scale = transform.zoom * dpr;
    let stroke = Stroke {
        width: (style.width as f64 / transform.zoom) as f32,
        ..Stroke::default()
    };

    let mut subpaths = 0;
    for tile in tile_range(transform, world_width, view_width) {
        // Tile origin in f64 so far pans wrap exactly like the raster.
        let origin_x = tile as f64 * world_width * transform.zoom - transform.pan_x;
        let t = Transform::from_row(
            scale as f32,
            0.0,
            0.0,
            scale as f32,
            (origin_x * dpr) as f32,
            (-transform.pan_y * dpr) as f32,
        );
        surface.stroke_path(&path, &paint, &stroke, t, None);
        subpaths += projected.len();
    }
    subpaths
}
