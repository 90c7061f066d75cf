//! Display unit conversion.
//!
//! Rasters always carry native units; conversion happens only when a value
//! is shown (tooltip, legend ticks), so switching units never re-renders.

use serde::{Deserialize, Serialize};

/// Unit transformation from native values to display values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum UnitTransform {
    /// No transformation
    #[default]
    None,
    /// Subtract a value (e.g., K→°C: subtract 273.15)
    Subtract(f64),
    /// Divide by a value (e.g., W/m²→kW/m²: divide by 1000)
    Divide(f64),
    /// value * scale + offset
    Linear { scale: f64, offset: f64 },
}

impl UnitTransform {
    /// Convert an absolute value.
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::None => value,
            Self::Subtract(offset) => value - offset,
            Self::Divide(divisor) => value / divisor,
            Self::Linear { scale, offset } => value * scale + offset,
        }
    }

    /// Convert a difference of two values; offsets cancel out.
    pub fn apply_delta(&self, delta: f64) -> f64 {
        match self {
            Self::None | Self::Subtract(_) => delta,
            Self::Divide(divisor) => delta / divisor,
            Self::Linear { scale, .. } => delta * scale,
        }
    }
}

/// Display units offered per catalogue variable; the first entry is the default.
pub fn display_units(variable: &str) -> &'static [&'static str] {
    match variable {
        "hurs" | "huss" => &["%"],
        "pr" => &["g m-2 s-1", "kg m-2 s-1"],
        "rlds" | "rsds" => &["W/m²", "kW/m²"],
        "sfcWind" => &["m s-1", "km h-1", "mph"],
        "tas" | "tasmax" | "tasmin" => &["K", "°C", "°F"],
        _ => &[],
    }
}

/// Native unit of a catalogue variable.
pub fn native_unit(variable: &str) -> Option<&'static str> {
    match variable {
        "hurs" | "huss" => Some("%"),
        "pr" => Some("kg m-2 s-1"),
        "rlds" | "rsds" => Some("W/m²"),
        "sfcWind" => Some("m s-1"),
        "tas" | "tasmax" | "tasmin" => Some("K"),
        _ => None,
    }
}

/// Transformation from `native` to `display`, if the pair is known.
pub fn unit_transform(native: &str, display: &str) -> Option<UnitTransform> {
    if native == display {
        return Some(UnitTransform::None);
    }
    let transform = match (native, display) {
        ("K", "°C") => UnitTransform::Subtract(273.15),
        ("K", "°F") => UnitTransform::Linear {
            scale: 1.8,
            offset: -459.67,
        },
        ("kg m-2 s-1", "g m-2 s-1") => UnitTransform::Linear {
            scale: 1000.0,
            offset: 0.0,
        },
        ("W/m²", "kW/m²") => UnitTransform::Divide(1000.0),
        ("m s-1", "km h-1") => UnitTransform::Linear {
            scale: 3.6,
            offset: 0.0,
        },
        ("m s-1", "mph") => UnitTransform::Linear {
            scale: 2.236_936,
            offset: 0.0,
        },
        _ => return None,
    };
    Some(transform)
}

/// Resolved display unit and transform for a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUnit {
    pub label: String,
    pub transform: UnitTransform,
}

impl DisplayUnit {
    pub fn native(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            transform: UnitTransform::None,
        }
    }

    /// Resolve the requested unit, falling back to the native unit when the
    /// conversion is unknown.
    pub fn resolve(variable: &str, requested: Option<&str>) -> Self {
        let Some(native) = native_unit(variable) else {
            return Self::native(requested.unwrap_or_default());
        };
        let wanted = requested.unwrap_or(native);
        match unit_transform(native, wanted) {
            Some(transform) => Self {
                label: wanted.to_string(),
                transform,
            },
            None => Self::native(native),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelvin_to_celsius() {
        let t = unit_transform("K", "°C").unwrap();
        assert!((t.apply(273.15) - 0.0).abs() < 1e-9);
        assert!((t.apply_delta(2.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_kelvin_to_fahrenheit() {
        let t = unit_transform("K", "°F").unwrap();
        assert!((t.apply(273.15) - 32.0).abs() < 1e-6);
        assert!((t.apply_delta(10.0) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_pair_falls_back_to_native() {
        let unit = DisplayUnit::resolve("tas", Some("mph"));
        assert_eq!(unit.label, "K");
        assert_eq!(unit.transform, UnitTransform::None);
    }

    #[test]
    fn test_default_display_unit_is_first() {
        assert_eq!(display_units("pr")[0], "g m-2 s-1");
        assert!(display_units("unknown").is_empty());
    }
}
