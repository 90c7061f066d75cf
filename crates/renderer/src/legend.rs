//! Legend gradient strip, tick labels and indicator placement.

use climate_common::{DisplayUnit, ValueRange, ViewerError, ViewerResult};
use tiny_skia::Pixmap;

use crate::color::Palette;

/// One labelled position along the legend strip.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendTick {
    /// 0 = left edge (range min), 1 = right edge (range max)
    pub fraction: f64,
    pub label: String,
}

/// A rendered legend: gradient strip plus min/mid/max ticks in display units.
#[derive(Debug, Clone)]
pub struct Legend {
    strip: Pixmap,
    range: ValueRange,
    ticks: Vec<LegendTick>,
    unit_label: String,
}

impl Legend {
    /// Render the strip left = min, right = max and format its ticks.
    ///
    /// `difference` selects delta conversion for tick values, so a kelvin
    /// difference is labelled as the same number of degrees Celsius.
    pub fn build(
        palette: &Palette,
        range: &ValueRange,
        unit: &DisplayUnit,
        difference: bool,
        width: u32,
        height: u32,
    ) -> ViewerResult<Self> {
        let mut strip = Pixmap::new(width, height).ok_or_else(|| {
            ViewerError::RenderError(format!("invalid legend size {}x{}", width, height))
        })?;

        let w = width as usize;
        let denom = (w.max(2) - 1) as f64;
        let row: Vec<[u8; 4]> = (0..w)
            .map(|x| {
                let c = palette.at(x as f64 / denom);
                [c.r, c.g, c.b, 255]
            })
            .collect();
        for line in strip.data_mut().chunks_exact_mut(w * 4) {
            for (dst, src) in line.chunks_exact_mut(4).zip(&row) {
                dst.copy_from_slice(src);
            }
        }

        let convert = |v: f64| {
            if difference {
                unit.transform.apply_delta(v)
            } else {
                unit.transform.apply(v)
            }
        };
        let lo = convert(range.min);
        let hi = convert(range.max);
        let span = (hi - lo).abs();
        let ticks = [0.0, 0.5, 1.0]
            .into_iter()
            .map(|fraction| LegendTick {
                fraction,
                label: format_value(convert(range.lerp(fraction)), span),
            })
            .collect();

        Ok(Self {
            strip,
            range: *range,
            ticks,
            unit_label: unit.label.clone(),
        })
    }

    pub fn strip(&self) -> &Pixmap {
        &self.strip
    }

    pub fn range(&self) -> &ValueRange {
        &self.range
    }

    pub fn ticks(&self) -> &[LegendTick] {
        &self.ticks
    }

    pub fn unit_label(&self) -> &str {
        &self.unit_label
    }

    /// Indicator position for a native value, clamped; 0.5 on a flat range.
    pub fn indicator_fraction(&self, value: f64) -> f64 {
        self.range.normalize(value)
    }
}

/// Format a display value with precision suited to the range it belongs to.
///
/// `span` is the width of the surrounding range (0 falls back to the value's
/// own magnitude).
pub fn format_value(value: f64, span: f64) -> String {
    if !value.is_finite() {
        return "–".to_string();
    }
    let scale = if span > 0.0 { span } else { value.abs() };
    if scale >= 100.0 {
        format!("{:.0}", value)
    } else if scale >= 1.0 || scale == 0.0 {
        format!("{:.1}", value)
    } else if scale >= 0.01 {
        format!("{:.3}", value)
    } else {
        format!("{:.2e}", value)
    }
}
