//! Viewport transform: zoom and pan over a horizontally wrapping world.
//!
//! Screen and world coordinates are CSS pixels. The world is the cached
//! bitmap at zoom 1, so `world = (screen + pan) / zoom` and
//! `screen = world * zoom - pan`.

/// Multiplier applied per wheel notch when zooming out (`delta_y > 0`).
pub const ZOOM_OUT_FACTOR: f64 = 0.9;
/// Multiplier applied per wheel notch when zooming in.
pub const ZOOM_IN_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl ViewportTransform {
    pub fn new(zoom: f64, pan_x: f64, pan_y: f64) -> Self {
        Self { zoom, pan_x, pan_y }
    }

    #[inline]
    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        ((sx + self.pan_x) / self.zoom, (sy + self.pan_y) / self.zoom)
    }

    #[inline]
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (wx * self.zoom - self.pan_x, wy * self.zoom - self.pan_y)
    }

    /// Zoom one wheel notch toward the pointer at (sx, sy).
    ///
    /// The world point under the pointer stays under it. Returns `false` and
    /// leaves pan untouched when the clamped zoom does not change.
    pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64, bounds: (f64, f64)) -> bool {
        let factor = if delta_y > 0.0 {
            ZOOM_OUT_FACTOR
        } else {
            ZOOM_IN_FACTOR
        };
        let new_zoom = (self.zoom * factor).clamp(bounds.0, bounds.1);
        if new_zoom == self.zoom {
            return false;
        }

        let (wx, wy) = self.screen_to_world(sx, sy);
        self.zoom = new_zoom;
        self.pan_x = wx * new_zoom - sx;
        self.pan_y = wy * new_zoom - sy;
        true
    }

    /// Clamp `pan_y` so the world cannot be dragged fully out of view.
    ///
    /// When the zoomed world is taller than the viewport the allowed range is
    /// `[0, H·zoom − view_h]`; when it is shorter it is `[H·zoom − view_h, 0]`.
    pub fn clamp_pan_y(&mut self, world_height: f64, view_height: f64) {
        let extent = world_height * self.zoom - view_height;
        self.pan_y = self.pan_y.clamp(extent.min(0.0), extent.max(0.0));
    }

    /// Visible world-x span `[pan_x / zoom, (pan_x + view_w) / zoom]`.
    pub fn visible_world_x(&self, view_width: f64) -> (f64, f64) {
        (self.pan_x / self.zoom, (self.pan_x + view_width) / self.zoom)
    }

    /// World-x of the viewport centre.
    pub fn world_center_x(&self, view_width: f64) -> f64 {
        (self.pan_x + view_width / 2.0) / self.zoom
    }
}

/// Idle → Dragging → Idle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        start_x: f64,
        start_y: f64,
        start_pan_x: f64,
        start_pan_y: f64,
    },
}

impl DragState {
    pub fn begin(transform: &ViewportTransform, x: f64, y: f64) -> Self {
        DragState::Dragging {
            start_x: x,
            start_y: y,
            start_pan_x: transform.pan_x,
            start_pan_y: transform.pan_y,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    /// Pan for the pointer at (x, y): start pan minus pointer displacement.
    pub fn pan_for(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match *self {
            DragState::Idle => None,
            DragState::Dragging {
                start_x,
                start_y,
                start_pan_x,
                start_pan_y,
            } => Some((start_pan_x - (x - start_x), start_pan_y - (y - start_y))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_screen_inverse() {
        let t = ViewportTransform::new(2.5, 130.0, -40.0);
        let (wx, wy) = t.screen_to_world(17.0, 99.0);
        let (sx, sy) = t.world_to_screen(wx, wy);
        assert!((sx - 17.0).abs() < 1e-9);
        assert!((sy - 99.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_pan() {
        let t = ViewportTransform::new(1.0, 10.0, 5.0);
        let drag = DragState::begin(&t, 100.0, 100.0);
        assert_eq!(drag.pan_for(130.0, 90.0), Some((-20.0, 15.0)));
        assert_eq!(DragState::Idle.pan_for(1.0, 1.0), None);
    }

    #[test]
    fn test_clamp_pan_y_zoomed_out() {
        let mut t = ViewportTransform::new(0.5, 0.0, 50.0);
        t.clamp_pan_y(180.0, 180.0);
        assert_eq!(t.pan_y, 0.0);
        t.pan_y = -200.0;
        t.clamp_pan_y(180.0, 180.0);
        assert_eq!(t.pan_y, -90.0);
    }
}
