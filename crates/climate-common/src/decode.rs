//! Raster payload decoding.
//!
//! Turns the encoded `data` field of a [`RasterPayload`] into a flat
//! [`NumericBuffer`]. Only an unrecognized dtype is an error; every other
//! malformed input decodes best-effort or yields `None`.

use base64::Engine;
use tracing::{debug, warn};

use crate::error::{ViewerError, ViewerResult};
use crate::grid::{DecodedGrid, GridGeometry, LonConvention, NumericBuffer};
use crate::payload::{DataEncoding, PayloadData, RasterPayload};

/// Declared element type of a base64 buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    Float32,
    Float64,
}

impl Dtype {
    pub fn parse(s: &str) -> ViewerResult<Self> {
        match s {
            "float32" | "<f4" | "f4" => Ok(Dtype::Float32),
            "float64" | "<f8" | "f8" => Ok(Dtype::Float64),
            other => Err(ViewerError::UnsupportedDtype(other.to_string())),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Dtype::Float32 => 4,
            Dtype::Float64 => 8,
        }
    }
}

/// Decode a payload's data field.
///
/// Returns `Ok(None)` when the payload carries no data ("nothing to render").
pub fn decode(payload: &RasterPayload) -> ViewerResult<Option<NumericBuffer>> {
    match (payload.encoding(), &payload.data) {
        (DataEncoding::None, _) | (_, None) => Ok(None),
        (DataEncoding::Base64, Some(PayloadData::Encoded(encoded))) => {
            let dtype = Dtype::parse(&payload.dtype)?;
            Ok(decode_base64(encoded, dtype))
        }
        (DataEncoding::List, Some(PayloadData::Values(rows))) => Ok(Some(flatten_values(rows))),
        (encoding, Some(_)) => {
            warn!(?encoding, "Payload data does not match its declared encoding");
            Ok(None)
        }
    }
}

/// Base64-decode and reinterpret as native-endian floats.
///
/// Trailing bytes that do not form a whole element are dropped.
pub fn decode_base64(encoded: &str, dtype: Dtype) -> Option<NumericBuffer> {
    let bytes = match base64::engine::general_purpose::STANDARD.decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Invalid base64 raster payload");
            return None;
        }
    };

    let usable = bytes.len() - bytes.len() % dtype.size();
    if usable != bytes.len() {
        debug!(
            dropped = bytes.len() - usable,
            "Dropping trailing bytes of partial element"
        );
    }

    let buffer = match dtype {
        Dtype::Float32 => NumericBuffer::F32(bytemuck::pod_collect_to_vec(&bytes[..usable])),
        Dtype::Float64 => NumericBuffer::F64(bytemuck::pod_collect_to_vec(&bytes[..usable])),
    };
    Some(buffer)
}

/// Flatten nested numeric lists (row-major) into a float32 buffer.
///
/// `null` and non-numeric leaves become NaN so the cell count is preserved.
pub fn flatten_values(values: &[serde_json::Value]) -> NumericBuffer {
    let mut out = Vec::new();
    for value in values {
        flatten_into(value, &mut out);
    }
    NumericBuffer::F32(out)
}

fn flatten_into(value: &serde_json::Value, out: &mut Vec<f32>) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        serde_json::Value::Number(n) => out.push(n.as_f64().map(|x| x as f32).unwrap_or(f32::NAN)),
        _ => out.push(f32::NAN),
    }
}

/// Decode a payload into a grid with validated shape and geometry.
///
/// `defaults` supplies the longitude convention and latitude extent when the
/// payload does not declare them.
pub fn decode_grid(
    payload: &RasterPayload,
    defaults: &GridGeometry,
) -> ViewerResult<Option<DecodedGrid>> {
    let Some(values) = decode(payload)? else {
        return Ok(None);
    };

    let geometry = resolve_geometry(payload, defaults)?;
    let (rows, cols) = payload.dims().ok_or(ViewerError::ShapeMismatch {
        rows: payload.shape.first().copied().unwrap_or(0),
        cols: payload.shape.get(1).copied().unwrap_or(0),
        len: values.len(),
    })?;

    debug!(
        variable = %payload.variable,
        rows,
        cols,
        dtype = values.dtype(),
        "Decoded raster payload"
    );
    DecodedGrid::new(values, rows, cols, geometry).map(Some)
}

fn resolve_geometry(payload: &RasterPayload, defaults: &GridGeometry) -> ViewerResult<GridGeometry> {
    let lon_convention = match &payload.lon_convention {
        Some(s) => s.parse::<LonConvention>()?,
        None => defaults.lon_convention,
    };
    let (north, south) = match payload.lat_extent {
        Some([north, south]) => (north, south),
        None => (defaults.north, defaults.south),
    };
    GridGeometry::new(lon_convention, north, south)
}
