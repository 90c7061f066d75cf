//! Geographic → screen projections of the whole world onto a W×H rectangle.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use climate_common::ViewerError;
use serde::{Deserialize, Serialize};

use crate::geographic::normalize_lon;

/// Latitude limit of Web Mercator (the square-world latitude).
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// World projection used for the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenProjection {
    /// Plate carrée: x and y linear in lon and lat
    #[default]
    Equirectangular,
    /// Spherical Web Mercator, latitudes clipped to ±85.05°
    WebMercator,
}

impl ScreenProjection {
    /// Project a point into a `width × height` world rectangle.
    ///
    /// Longitude is normalized into (-180, 180] first so horizontal tiling
    /// is well defined.
    #[inline]
    pub fn project(&self, lon: f64, lat: f64, width: f64, height: f64) -> (f64, f64) {
        let x = (normalize_lon(lon) + 180.0) / 360.0 * width;
        let y = match self {
            ScreenProjection::Equirectangular => (90.0 - lat) / 180.0 * height,
            ScreenProjection::WebMercator => {
                let phi = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
                let merc = (PI / 4.0 + phi / 2.0).tan().ln();
                (1.0 - merc / PI) / 2.0 * height
            }
        };
        (x, y)
    }

    /// Inverse of [`project`](Self::project) for a point inside the rectangle.
    pub fn unproject(&self, x: f64, y: f64, width: f64, height: f64) -> (f64, f64) {
        let lon = normalize_lon(x / width * 360.0 - 180.0);
        let lat = match self {
            ScreenProjection::Equirectangular => 90.0 - y / height * 180.0,
            ScreenProjection::WebMercator => {
                let merc = PI * (1.0 - 2.0 * y / height);
                (2.0 * merc.exp().atan() - PI / 2.0).to_degrees()
            }
        };
        (lon, lat)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenProjection::Equirectangular => "equirectangular",
            ScreenProjection::WebMercator => "web_mercator",
        }
    }
}

impl FromStr for ScreenProjection {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "equirectangular" | "plate_carree" | "epsg:4326" => Ok(ScreenProjection::Equirectangular),
            "web_mercator" | "mercator" | "epsg:3857" => Ok(ScreenProjection::WebMercator),
            other => Err(ViewerError::ProjectionError(format!(
                "unknown projection '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ScreenProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equirectangular_corners() {
        let p = ScreenProjection::Equirectangular;
        assert_eq!(p.project(-180.0 + 1e-12, 90.0, 360.0, 180.0).1, 0.0);
        let (x, y) = p.project(0.0, 0.0, 360.0, 180.0);
        assert!((x - 180.0).abs() < 1e-9);
        assert!((y - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_longitude_normalized_before_projecting() {
        let p = ScreenProjection::Equirectangular;
        let (a, _) = p.project(190.0, 0.0, 360.0, 180.0);
        let (b, _) = p.project(-170.0, 0.0, 360.0, 180.0);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_equator_is_centre() {
        let p = ScreenProjection::WebMercator;
        let (_, y) = p.project(0.0, 0.0, 512.0, 512.0);
        assert!((y - 256.0).abs() < 1e-9);
        let (_, top) = p.project(0.0, 89.9, 512.0, 512.0);
        assert!(top.abs() < 1e-6);
    }

    #[test]
    fn test_unproject_inverts_project() {
        for p in [ScreenProjection::Equirectangular, ScreenProjection::WebMercator] {
            let (x, y) = p.project(-73.9, 40.7, 1000.0, 600.0);
            let (lon, lat) = p.unproject(x, y, 1000.0, 600.0);
            assert!((lon - (-73.9)).abs() < 1e-9);
            assert!((lat - 40.7).abs() < 1e-9);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "web_mercator".parse::<ScreenProjection>().unwrap(),
            ScreenProjection::WebMercator
        );
        assert!("lambert".parse::<ScreenProjection>().is_err());
    }
}
