//! Pointer input fed to the map view, in CSS pixels relative to the surface.

use serde::{Deserialize, Serialize};

use crate::lookup::TooltipUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    /// Positive `delta_y` zooms out, anything else zooms in
    Wheel { x: f64, y: f64, delta_y: f64 },
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Leave,
}

/// What the host has to do after an event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointerOutcome {
    /// The transform changed; the frame must be redrawn
    pub redraw: bool,
    /// Tooltip and legend indicator change, if any
    pub tooltip: Option<TooltipUpdate>,
}

impl PointerOutcome {
    pub fn redraw() -> Self {
        Self {
            redraw: true,
            tooltip: None,
        }
    }

    pub fn tooltip(update: TooltipUpdate) -> Self {
        Self {
            redraw: false,
            tooltip: Some(update),
        }
    }
}
