//! Grid index ↔ geographic coordinate conversion.
//!
//! Row 0 of every grid is the northern edge. The longitude convention and
//! latitude extent come from the grid's [`GridGeometry`], validated once at
//! decode time, so nothing here branches on raw payload fields.

use climate_common::{GridGeometry, LonConvention};

/// Normalize a longitude into (-180, 180].
#[inline]
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Longitude and latitude of the centre of grid cell (x, y).
///
/// The returned longitude is always in (-180, 180].
#[inline]
pub fn grid_to_lonlat(
    x: usize,
    y: usize,
    cols: usize,
    rows: usize,
    geometry: &GridGeometry,
) -> (f64, f64) {
    let lon_step = 360.0 / cols as f64;
    let lat_step = geometry.lat_span() / rows as f64;

    let lon = match geometry.lon_convention {
        LonConvention::ZeroTo360 => {
            let raw = x as f64 * lon_step + lon_step / 2.0;
            if raw > 180.0 {
                raw - 360.0
            } else {
                raw
            }
        }
        LonConvention::Signed180 => -180.0 + x as f64 * lon_step + lon_step / 2.0,
    };
    let lat = geometry.north - y as f64 * lat_step - lat_step / 2.0;

    (normalize_lon(lon), lat)
}

/// Grid cell (x, y) containing a geographic point, if it lies on the grid.
pub fn lonlat_to_grid(
    lon: f64,
    lat: f64,
    cols: usize,
    rows: usize,
    geometry: &GridGeometry,
) -> Option<(usize, usize)> {
    if !lon.is_finite() || !lat.is_finite() || lat > geometry.north || lat < geometry.south {
        return None;
    }

    let origin = match geometry.lon_convention {
        LonConvention::ZeroTo360 => 0.0,
        LonConvention::Signed180 => -180.0,
    };
    let offset = (lon - origin).rem_euclid(360.0);
    let x = ((offset / 360.0) * cols as f64).floor() as usize;
    let y = (((geometry.north - lat) / geometry.lat_span()) * rows as f64).floor() as usize;

    Some((x.min(cols - 1), y.min(rows - 1)))
}
