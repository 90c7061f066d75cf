//! Place labels: zoom gating, priority order and greedy collision avoidance.

use projection::ScreenProjection;
use renderer::{Rgb, TextRenderer};
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

use crate::transform::ViewportTransform;

/// Padding around each label box when testing for overlap, CSS pixels.
pub const LABEL_PADDING: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub min_zoom: f64,
    /// Lower is more important
    pub priority: u32,
}

/// Static label list, kept sorted by priority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    pub fn new(mut labels: Vec<Label>) -> Self {
        labels.sort_by_key(|l| l.priority);
        Self { labels }
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let labels: Vec<Label> = serde_json::from_value(value)?;
        Ok(Self::new(labels))
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Maximum number of labels drawn at a zoom level.
pub fn max_labels(zoom: f64) -> usize {
    if zoom < 1.5 {
        15
    } else if zoom < 3.0 {
        40
    } else if zoom < 6.0 {
        100
    } else {
        250
    }
}

/// Axis-aligned box in screen CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl LabelBox {
    pub fn overlaps(&self, other: &LabelBox) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }
}

/// A label accepted for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub name: String,
    /// Anchor point on screen, CSS pixels
    pub x: f64,
    pub y: f64,
    /// Padded bounding box used for collision tests
    pub bounds: LabelBox,
    /// Text size
    pub width: f64,
    pub height: f64,
}

/// Choose the labels to draw for the current transform.
///
/// Each label is placed at the tile copy nearest the viewport centre, so it
/// does not jump between copies while panning. `measure` returns the text
/// size in CSS pixels.
pub fn place_labels<F>(
    set: &LabelSet,
    projection: ScreenProjection,
    transform: &ViewportTransform,
    world: (f64, f64),
    view: (f64, f64),
    measure: F,
) -> Vec<PlacedLabel>
where
    F: Fn(&str) -> (f64, f64),
{
    let (world_width, world_height) = world;
    let (view_width, view_height) = view;
    let limit = max_labels(transform.zoom);
    let center = transform.world_center_x(view_width);

    let mut placed: Vec<PlacedLabel> = Vec::new();
    for label in set.labels() {
        if placed.len() >= limit {
            break;
        }
        if label.min_zoom > transform.zoom {
            continue;
        }

        let (wx, wy) = projection.project(label.lon, label.lat, world_width, world_height);
        let k = ((center - wx) / world_width).round();
        let (x, y) = transform.world_to_screen(wx + k * world_width, wy);

        let (width, height) = measure(&label.name);
        let bounds = LabelBox {
            x0: x - width / 2.0 - LABEL_PADDING,
            y0: y - height / 2.0 - LABEL_PADDING,
            x1: x + width / 2.0 + LABEL_PADDING,
            y1: y + height / 2.0 + LABEL_PADDING,
        };
        let visible = bounds.x1 > 0.0 && bounds.x0 < view_width && bounds.y1 > 0.0 && bounds.y0 < view_height;
        if !visible || placed.iter().any(|p| p.bounds.overlaps(&bounds)) {
            continue;
        }

        placed.push(PlacedLabel {
            name: label.name.clone(),
            x,
            y,
            bounds,
            width,
            height,
        });
    }
    placed
}

/// Draw placed labels centred on their anchors.
pub fn draw_labels(
    surface: &mut Pixmap,
    placed: &[PlacedLabel],
    text: &TextRenderer,
    font_size: f32,
    color: Rgb,
    dpr: f64,
) {
    let halo = Rgb::new(0, 0, 0);
    let size = font_size * dpr as f32;
    for label in placed {
        let x = ((label.x - label.width / 2.0) * dpr) as f32;
        let y = ((label.y - label.height / 2.0) * dpr) as f32;
        text.draw_with_halo(surface, &label.name, x, y, size, color, halo);
    }
}
