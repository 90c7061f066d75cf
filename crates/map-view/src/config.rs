//! Map view configuration.
//!
//! Deserialized from the `map` section of the viewer YAML file; every field
//! has a default so an empty section is valid.

use climate_common::catalog;
use climate_common::{GridGeometry, LonConvention, ViewerError, ViewerResult};
use projection::ScreenProjection;
use renderer::{hex_to_rgb, Rgb};
use serde::{Deserialize, Serialize};

/// Geometry, interaction limits and styling of the map surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapViewConfig {
    /// Viewport width in CSS pixels; also the world width at zoom 1
    #[serde(default = "default_width")]
    pub width: u32,
    /// Viewport height in CSS pixels; also the world height at zoom 1
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_dpr")]
    pub device_pixel_ratio: f32,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    #[serde(default)]
    pub projection: ScreenProjection,

    /// Longitude convention assumed when a payload does not declare one
    #[serde(default)]
    pub lon_convention: LonConvention,
    #[serde(default = "default_lat_north")]
    pub lat_north: f64,
    #[serde(default = "default_lat_south")]
    pub lat_south: f64,

    #[serde(default = "default_palette")]
    pub palette: String,
    /// Palette used for compare-mode difference fields
    #[serde(default = "default_diverging_palette")]
    pub diverging_palette: String,

    /// Zoom at which the fine border set replaces the coarse one
    #[serde(default = "default_fine_border_zoom")]
    pub fine_border_zoom: f64,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    #[serde(default = "default_border_width")]
    pub border_width: f32,
    #[serde(default = "default_label_color")]
    pub label_color: String,
    #[serde(default = "default_label_font_size")]
    pub label_font_size: f32,

    /// Tooltip offset from the pointer in CSS pixels
    #[serde(default = "default_tooltip_offset")]
    pub tooltip_offset: f64,
    #[serde(default = "default_legend_width")]
    pub legend_width: u32,
    #[serde(default = "default_legend_height")]
    pub legend_height: u32,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    640
}

fn default_dpr() -> f32 {
    1.0
}

fn default_min_zoom() -> f64 {
    0.5
}

fn default_max_zoom() -> f64 {
    10.0
}

fn default_lat_north() -> f64 {
    90.0
}

fn default_lat_south() -> f64 {
    -90.0
}

fn default_palette() -> String {
    "viridis".to_string()
}

fn default_diverging_palette() -> String {
    "diverging".to_string()
}

fn default_fine_border_zoom() -> f64 {
    3.0
}

fn default_background() -> String {
    "#1a1a2e".to_string()
}

fn default_border_color() -> String {
    "#ffffff".to_string()
}

fn default_border_width() -> f32 {
    0.8
}

fn default_label_color() -> String {
    "#f0f0f0".to_string()
}

fn default_label_font_size() -> f32 {
    11.0
}

fn default_tooltip_offset() -> f64 {
    12.0
}

fn default_legend_width() -> u32 {
    256
}

fn default_legend_height() -> u32 {
    12
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            device_pixel_ratio: default_dpr(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            projection: ScreenProjection::default(),
            lon_convention: LonConvention::default(),
            lat_north: default_lat_north(),
            lat_south: default_lat_south(),
            palette: default_palette(),
            diverging_palette: default_diverging_palette(),
            fine_border_zoom: default_fine_border_zoom(),
            background: default_background(),
            border_color: default_border_color(),
            border_width: default_border_width(),
            label_color: default_label_color(),
            label_font_size: default_label_font_size(),
            tooltip_offset: default_tooltip_offset(),
            legend_width: default_legend_width(),
            legend_height: default_legend_height(),
        }
    }
}

impl MapViewConfig {
    pub fn validate(&self) -> ViewerResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ViewerError::InvalidConfig(format!(
                "map size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0) {
            return Err(ViewerError::InvalidConfig(format!(
                "device_pixel_ratio must be positive, got {}",
                self.device_pixel_ratio
            )));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(ViewerError::InvalidConfig(format!(
                "zoom bounds must satisfy 0 < min_zoom <= max_zoom, got [{}, {}]",
                self.min_zoom, self.max_zoom
            )));
        }
        self.geometry()?;
        for palette in [&self.palette, &self.diverging_palette] {
            if !catalog::is_palette(palette) {
                return Err(ViewerError::UnknownPalette(palette.clone()));
            }
        }
        self.background_rgb()?;
        self.border_rgb()?;
        self.label_rgb()?;
        if self.legend_width == 0 || self.legend_height == 0 {
            return Err(ViewerError::InvalidConfig("legend size must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Default grid geometry for payloads that do not declare their own.
    pub fn geometry(&self) -> ViewerResult<GridGeometry> {
        GridGeometry::new(self.lon_convention, self.lat_north, self.lat_south)
    }

    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Backing store size: CSS size times the device pixel ratio, rounded.
    pub fn surface_size(&self) -> (u32, u32) {
        let dpr = self.device_pixel_ratio as f64;
        (
            ((self.width as f64 * dpr).round() as u32).max(1),
            ((self.height as f64 * dpr).round() as u32).max(1),
        )
    }

    pub fn background_rgb(&self) -> ViewerResult<Rgb> {
        parse_color(&self.background)
    }

    pub fn border_rgb(&self) -> ViewerResult<Rgb> {
        parse_color(&self.border_color)
    }

    pub fn label_rgb(&self) -> ViewerResult<Rgb> {
        parse_color(&self.label_color)
    }
}

fn parse_color(hex: &str) -> ViewerResult<Rgb> {
    hex_to_rgb(hex).ok_or_else(|| ViewerError::InvalidColor(hex.to_string()))
}
