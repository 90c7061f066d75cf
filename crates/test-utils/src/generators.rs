//! Synthetic climate grids and raster payloads.
//!
//! Grids are row-major with row 0 at the north edge, matching the layout
//! the decoder produces. Payload builders return `serde_json::Value` so any
//! crate can deserialize them into its own wire types.

use base64::Engine;
use serde_json::{json, Value};

/// Creates a grid with predictable values: `row * cols + col`.
///
/// # Example
///
/// ```
/// use test_utils::create_sequence_grid;
///
/// let grid = create_sequence_grid(2, 3);
/// assert_eq!(grid, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
/// ```
pub fn create_sequence_grid(rows: usize, cols: usize) -> Vec<f32> {
    (0..rows * cols).map(|i| i as f32).collect()
}

/// Creates a near-surface temperature field in Kelvin.
///
/// Warm at the equator (~300K), cold at the poles (~240K), with a small
/// longitudinal wave so neighbouring columns differ.
pub fn create_temperature_grid(rows: usize, cols: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        // Latitude of the cell centre, 90 at the top
        let lat = 90.0 - (row as f32 + 0.5) * 180.0 / rows as f32;
        let base = 300.0 - 60.0 * (lat.abs() / 90.0);
        for col in 0..cols {
            let phase = col as f32 / cols as f32 * std::f32::consts::TAU;
            data.push(base + 2.0 * phase.sin());
        }
    }
    data
}

/// Creates a precipitation field (kg m-2 s-1) with NaN over "ocean".
///
/// Every cell whose column falls in the left third of the grid is masked,
/// so tests can check that missing cells are never painted.
pub fn create_masked_precipitation_grid(rows: usize, cols: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            if col < cols / 3 {
                data.push(f32::NAN);
            } else {
                data.push(((row + col) % 7) as f32 * 1.0e-5);
            }
        }
    }
    data
}

/// Creates a grid filled with a single value.
pub fn create_constant_grid(rows: usize, cols: usize, value: f32) -> Vec<f32> {
    vec![value; rows * cols]
}

/// Creates a grid where every cell is non-finite.
pub fn create_empty_grid(rows: usize, cols: usize) -> Vec<f32> {
    (0..rows * cols)
        .map(|i| if i % 2 == 0 { f32::NAN } else { f32::INFINITY })
        .collect()
}

/// Base64-encodes float32 values in native byte order.
pub fn encode_f32(values: &[f32]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Base64-encodes float64 values in native byte order.
pub fn encode_f64(values: &[f64]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn payload_shell(variable: &str, rows: usize, cols: usize, dtype: &str) -> Value {
    json!({
        "variable": variable,
        "model": "ACCESS-CM2",
        "scenario": "ssp245",
        "time": "2050-07-01",
        "shape": [rows, cols],
        "dtype": dtype,
        "resolution": "medium",
        "metadata": {
            "variable": {"name": variable, "unit": "K", "description": "synthetic"},
            "scenario": {"period": "2015-2100", "type": "projection", "description": "synthetic"}
        }
    })
}

/// Builds a `/data` response with a base64 float32 buffer.
pub fn base64_payload(variable: &str, rows: usize, cols: usize, values: &[f32]) -> Value {
    let mut payload = payload_shell(variable, rows, cols, "float32");
    payload["data"] = json!(encode_f32(values));
    payload["data_encoding"] = json!("base64");
    payload
}

/// Builds a `/data` response with a base64 float64 buffer.
pub fn base64_payload_f64(variable: &str, rows: usize, cols: usize, values: &[f64]) -> Value {
    let mut payload = payload_shell(variable, rows, cols, "float64");
    payload["data"] = json!(encode_f64(values));
    payload["data_encoding"] = json!("base64");
    payload
}

/// Builds a `/data` response with nested row lists. NaN cells become `null`.
pub fn list_payload(variable: &str, rows: usize, cols: usize, values: &[f32]) -> Value {
    let nested: Vec<Value> = values
        .chunks(cols.max(1))
        .map(|row| {
            Value::Array(
                row.iter()
                    .map(|v| if v.is_finite() { json!(v) } else { Value::Null })
                    .collect(),
            )
        })
        .collect();
    let mut payload = payload_shell(variable, rows, cols, "float32");
    payload["data"] = Value::Array(nested);
    payload["data_encoding"] = json!("list");
    payload
}

/// Builds a `/data` response that carries no data.
pub fn empty_payload(variable: &str, rows: usize, cols: usize) -> Value {
    let mut payload = payload_shell(variable, rows, cols, "float32");
    payload["data"] = Value::Null;
    payload["data_encoding"] = json!("none");
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_grid_layout() {
        let grid = create_sequence_grid(3, 4);
        assert_eq!(grid.len(), 12);
        assert_eq!(grid[4], 4.0); // row 1, col 0
    }

    #[test]
    fn test_temperature_grid_equator_warmer_than_pole() {
        let grid = create_temperature_grid(10, 8);
        let top = grid[0];
        let middle = grid[4 * 8];
        assert!(middle > top);
        assert!(grid.iter().all(|v| (230.0..=310.0).contains(v)));
    }

    #[test]
    fn test_masked_grid_has_nans() {
        let grid = create_masked_precipitation_grid(4, 9);
        assert!(grid[0].is_nan());
        assert!(grid[3].is_finite());
    }

    #[test]
    fn test_list_payload_nests_rows() {
        let payload = list_payload("tas", 2, 2, &[1.0, 2.0, f32::NAN, 4.0]);
        assert_eq!(payload["data"][1][0], Value::Null);
        assert_eq!(payload["data"][1][1], json!(4.0));
    }

    #[test]
    fn test_base64_length() {
        let encoded = encode_f32(&[1.0, 2.0, 3.0]);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(bytes.len(), 12);
    }
}
