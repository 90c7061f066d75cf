//! Color palettes and piecewise-linear palette interpolation.

use climate_common::{ViewerError, ViewerResult};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_color(&self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, 255)
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<Rgb> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some(Rgb::new(r, g, b))
}

/// Map `t` to a color by linear interpolation between ordered anchors.
///
/// `t` is clamped to [0, 1] first. A single anchor is returned for every `t`;
/// an empty slice yields black.
#[inline]
pub fn interpolate(colors: &[Rgb], t: f64) -> Rgb {
    let Some(last) = colors.len().checked_sub(1) else {
        return Rgb::new(0, 0, 0);
    };
    if last == 0 {
        return colors[0];
    }

    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let pos = t * last as f64;
    let i = (pos.floor() as usize).min(last);
    let j = (i + 1).min(last);
    let frac = pos - i as f64;

    let lerp = |a: u8, b: u8| -> u8 {
        (a as f64 + (b as f64 - a as f64) * frac).round().clamp(0.0, 255.0) as u8
    };
    let (a, b) = (colors[i], colors[j]);
    Rgb::new(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
}

const VIRIDIS: &[&str] = &[
    "#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58",
    "#b5de2b", "#fde725",
];

const MAGMA: &[&str] = &[
    "#000004", "#1c1044", "#4f127b", "#812581", "#b5367a", "#e55964", "#fb8761", "#fec287",
    "#fcfdbf",
];

const CIVIDIS: &[&str] = &[
    "#00224e", "#123570", "#3b496c", "#575d6d", "#707173", "#8a8678", "#a59c74", "#c3b369",
    "#e1cc55", "#fee838",
];

const THERMAL: &[&str] = &[
    "#042333", "#2c3395", "#744992", "#b15f82", "#eb7655", "#fbb43d", "#e8fa5b",
];

const DIVERGING: &[&str] = &[
    "#2166ac", "#67a9cf", "#d1e5f0", "#f7f7f7", "#fddbc7", "#ef8a62", "#b2182b",
];

const GRAYSCALE: &[&str] = &["#000000", "#ffffff"];

/// A named, immutable list of anchor colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    name: String,
    colors: Vec<Rgb>,
}

impl Palette {
    /// Build a palette from hex anchors.
    pub fn from_hex(name: &str, anchors: &[&str]) -> ViewerResult<Self> {
        if anchors.is_empty() {
            return Err(ViewerError::InvalidColor(format!("palette '{}' has no colors", name)));
        }
        let colors = anchors
            .iter()
            .map(|hex| hex_to_rgb(hex).ok_or_else(|| ViewerError::InvalidColor(hex.to_string())))
            .collect::<ViewerResult<Vec<_>>>()?;
        Ok(Self {
            name: name.to_string(),
            colors,
        })
    }

    /// Look up a palette of the built-in catalog.
    pub fn by_name(name: &str) -> ViewerResult<Self> {
        let anchors = match name {
            "viridis" => VIRIDIS,
            "magma" => MAGMA,
            "cividis" => CIVIDIS,
            "thermal" => THERMAL,
            "diverging" => DIVERGING,
            "grayscale" => GRAYSCALE,
            other => return Err(ViewerError::UnknownPalette(other.to_string())),
        };
        Self::from_hex(name, anchors)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    #[inline]
    pub fn at(&self, t: f64) -> Rgb {
        interpolate(&self.colors, t)
    }
}
