//! Pointer → data value lookup, tooltip text and legend indicator sync.
//!
//! Lookup is O(1): invert the transform, wrap the world x into the bitmap,
//! floor to a pixel and read the lookup table. It runs on every pointer move.

use climate_common::{DisplayUnit, ValueRange};
use projection::ScreenProjection;
use renderer::{format_value, ValueLookupTable};
use serde::Serialize;

use crate::transform::ViewportTransform;

/// A value found under the pointer, in native units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointValue {
    pub lon: f64,
    pub lat: f64,
    pub value: f64,
    /// Pixel of the lookup table that was read
    pub pixel: (i64, i64),
}

/// Read the value under screen point (sx, sy).
///
/// Negative world x wraps around (`-5` in a 360-wide bitmap reads column 355).
/// Out-of-bounds rows and unpainted pixels yield `None`.
pub fn lookup(
    table: &ValueLookupTable,
    transform: &ViewportTransform,
    projection: ScreenProjection,
    sx: f64,
    sy: f64,
) -> Option<PointValue> {
    let (wx, wy) = transform.screen_to_world(sx, sy);
    let width = table.width() as f64;
    let height = table.height() as f64;
    if !(wx.is_finite() && wy.is_finite()) || width == 0.0 {
        return None;
    }

    let mut nx = wx.rem_euclid(width);
    // rem_euclid rounds up to `width` for tiny negative inputs
    if nx >= width {
        nx -= width;
    }
    let ix = nx.floor() as i64;
    let iy = wy.floor() as i64;
    let value = table.get(ix, iy)?;

    let (lon, lat) = projection.unproject(nx, wy, width, height);
    Some(PointValue {
        lon,
        lat,
        value,
        pixel: (ix, iy),
    })
}

/// Tooltip and legend indicator state for the host to display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TooltipUpdate {
    Show {
        text: String,
        /// Screen position of the tooltip (pointer + offset)
        x: f64,
        y: f64,
        /// Indicator position along the legend, 0 = min, 1 = max
        legend_fraction: f64,
    },
    Hide,
}

impl TooltipUpdate {
    pub fn is_visible(&self) -> bool {
        matches!(self, TooltipUpdate::Show { .. })
    }
}

/// Display settings that turn a native value into tooltip text.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDisplay {
    pub unit: DisplayUnit,
    pub range: ValueRange,
    /// Values are differences; only the scale of the unit transform applies
    pub difference: bool,
}

impl ValueDisplay {
    pub fn convert(&self, value: f64) -> f64 {
        if self.difference {
            self.unit.transform.apply_delta(value)
        } else {
            self.unit.transform.apply(value)
        }
    }

    /// Span of the range in display units, used to pick a precision.
    pub fn display_span(&self) -> f64 {
        (self.convert(self.range.max) - self.convert(self.range.min)).abs()
    }

    pub fn text(&self, point: &PointValue) -> String {
        let value = format_value(self.convert(point.value), self.display_span());
        let unit = if self.unit.label.is_empty() {
            String::new()
        } else {
            format!(" {}", self.unit.label)
        };
        format!(
            "{}{}\n{:.2}°{}, {:.2}°{}",
            value,
            unit,
            point.lat.abs(),
            if point.lat >= 0.0 { "N" } else { "S" },
            point.lon.abs(),
            if point.lon >= 0.0 { "E" } else { "W" },
        )
    }
}

/// Tooltip update for a lookup result at pointer (sx, sy).
pub fn tooltip_for(
    found: Option<&PointValue>,
    display: &ValueDisplay,
    sx: f64,
    sy: f64,
    offset: f64,
) -> TooltipUpdate {
    match found {
        Some(point) => TooltipUpdate::Show {
            text: display.text(point),
            x: sx + offset,
            y: sy + offset,
            legend_fraction: display.range.normalize(point.value),
        },
        None => TooltipUpdate::Hide,
    }
}
