//! Tests for raster payload decoding and value ranges.

use climate_common::{
    decode, decode_grid, GridGeometry, LonConvention, NumericBuffer, RasterPayload, ValueRange,
    ViewerError,
};
use test_utils::{
    base64_payload, base64_payload_f64, create_constant_grid, create_empty_grid,
    create_sequence_grid, empty_payload, list_payload,
};

fn parse(value: serde_json::Value) -> RasterPayload {
    serde_json::from_value(value).unwrap()
}

// ============================================================================
// decode tests
// ============================================================================

#[test]
fn test_decode_none_encoding_is_no_data() {
    let payload = parse(empty_payload("tas", 600, 1440));
    assert!(decode(&payload).unwrap().is_none());
}

#[test]
fn test_decode_base64_float32() {
    let values = create_sequence_grid(3, 4);
    let payload = parse(base64_payload("tas", 3, 4, &values));
    let buffer = decode(&payload).unwrap().unwrap();
    assert_eq!(buffer, NumericBuffer::F32(values));
}

#[test]
fn test_decode_base64_float64() {
    let values = vec![1.25f64, -3.5, f64::NAN, 1.0e10];
    let payload = parse(base64_payload_f64("pr", 2, 2, &values));
    let buffer = decode(&payload).unwrap().unwrap();
    assert_eq!(buffer.dtype(), "float64");
    assert_eq!(buffer.get(0), Some(1.25));
    assert!(buffer.get(2).unwrap().is_nan());
    assert_eq!(buffer.get(3), Some(1.0e10));
}

#[test]
fn test_decode_unknown_dtype_fails() {
    let mut json = base64_payload("tas", 1, 2, &[1.0, 2.0]);
    json["dtype"] = serde_json::json!("int16");
    let payload = parse(json);
    assert!(matches!(
        decode(&payload),
        Err(ViewerError::UnsupportedDtype(ref d)) if d == "int16"
    ));
}

#[test]
fn test_decode_list_preserves_missing_cells() {
    let values = vec![1.0, f32::NAN, 3.0, 4.0];
    let payload = parse(list_payload("tas", 2, 2, &values));
    let buffer = decode(&payload).unwrap().unwrap();
    assert_eq!(buffer.len(), 4);
    assert!(buffer.get(1).unwrap().is_nan());
    assert_eq!(buffer.get(3), Some(4.0));
}

#[test]
fn test_decode_list_ignores_dtype() {
    let mut json = list_payload("tas", 1, 2, &[1.0, 2.0]);
    json["dtype"] = serde_json::json!("whatever");
    let payload = parse(json);
    assert_eq!(decode(&payload).unwrap().unwrap().len(), 2);
}

#[test]
fn test_decode_mismatched_encoding_yields_none() {
    let mut json = list_payload("tas", 1, 2, &[1.0, 2.0]);
    json["data_encoding"] = serde_json::json!("base64");
    let payload = parse(json);
    assert!(decode(&payload).unwrap().is_none());
}

// ============================================================================
// decode_grid tests
// ============================================================================

#[test]
fn test_decode_grid_uses_default_geometry() {
    let payload = parse(base64_payload("tas", 2, 2, &[1.0, 2.0, 3.0, 4.0]));
    let grid = decode_grid(&payload, &GridGeometry::default()).unwrap().unwrap();
    assert_eq!(grid.rows(), 2);
    assert_eq!(grid.cols(), 2);
    assert_eq!(grid.geometry().lon_convention, LonConvention::ZeroTo360);
    assert_eq!(grid.value(1, 0), Some(3.0));
}

#[test]
fn test_decode_grid_payload_geometry_overrides() {
    let mut json = base64_payload("tas", 2, 2, &[1.0, 2.0, 3.0, 4.0]);
    json["lon_convention"] = serde_json::json!("-180-180");
    json["lat_extent"] = serde_json::json!([90.0, -60.0]);
    let payload = parse(json);
    let grid = decode_grid(&payload, &GridGeometry::default()).unwrap().unwrap();
    assert_eq!(grid.geometry().lon_convention, LonConvention::Signed180);
    assert_eq!(grid.geometry().south, -60.0);
}

#[test]
fn test_decode_grid_rejects_bad_convention() {
    let mut json = base64_payload("tas", 1, 1, &[1.0]);
    json["lon_convention"] = serde_json::json!("east-positive");
    let payload = parse(json);
    assert!(matches!(
        decode_grid(&payload, &GridGeometry::default()),
        Err(ViewerError::UnsupportedLonConvention(_))
    ));
}

#[test]
fn test_decode_grid_shape_mismatch() {
    let payload = parse(base64_payload("tas", 3, 3, &[1.0, 2.0, 3.0, 4.0]));
    assert!(matches!(
        decode_grid(&payload, &GridGeometry::default()),
        Err(ViewerError::ShapeMismatch { rows: 3, cols: 3, len: 4 })
    ));
}

#[test]
fn test_decode_grid_oversized_shape_rejected() {
    let mut value = list_payload("tas", 1, 1, &[1.0]);
    value["shape"] = serde_json::json!([4611686018427387904usize, 8]);
    let payload = parse(value);
    assert!(matches!(
        decode_grid(&payload, &GridGeometry::default()),
        Err(ViewerError::ShapeMismatch { cols: 8, len: 1, .. })
    ));

    let wrapping = NumericBuffer::F32(Vec::new());
    let grid = climate_common::DecodedGrid::new(wrapping, 1usize << 63, 2, GridGeometry::default());
    assert!(grid.is_err());
}

#[test]
fn test_decode_grid_no_data_passes_through() {
    let payload = parse(empty_payload("tas", 2, 2));
    assert!(decode_grid(&payload, &GridGeometry::default()).unwrap().is_none());
}

// ============================================================================
// ValueRange tests
// ============================================================================

#[test]
fn test_range_bounds_every_finite_cell() {
    let values = test_utils::create_masked_precipitation_grid(12, 30);
    let payload = parse(base64_payload("pr", 12, 30, &values));
    let grid = decode_grid(&payload, &GridGeometry::default()).unwrap().unwrap();
    let range = ValueRange::of_grid(&grid).unwrap();
    for v in grid.values().iter().filter(|v| v.is_finite()) {
        assert!(range.min <= v && v <= range.max);
    }
}

#[test]
fn test_range_all_missing_is_error() {
    let payload = parse(base64_payload("tas", 2, 3, &create_empty_grid(2, 3)));
    let grid = decode_grid(&payload, &GridGeometry::default()).unwrap().unwrap();
    let err = ValueRange::of_grid(&grid).unwrap_err();
    assert!(err.is_degenerate_data());
    assert_eq!(err.to_string(), "Dataset contains no valid numeric values");
}

#[test]
fn test_range_flat_field() {
    let payload = parse(base64_payload("tas", 2, 2, &create_constant_grid(2, 2, 5.0)));
    let grid = decode_grid(&payload, &GridGeometry::default()).unwrap().unwrap();
    let range = ValueRange::of_grid(&grid).unwrap();
    assert_eq!((range.min, range.max), (5.0, 5.0));
    assert_eq!(range.normalize(5.0), 0.5);
}

#[test]
fn test_range_is_deterministic() {
    let values = test_utils::create_temperature_grid(20, 40);
    let payload = parse(base64_payload("tas", 20, 40, &values));
    let grid = decode_grid(&payload, &GridGeometry::default()).unwrap().unwrap();
    assert_eq!(ValueRange::of_grid(&grid).unwrap(), ValueRange::of_grid(&grid).unwrap());
}
