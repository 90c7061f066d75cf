//! Tests for the legend strip, tick labels and indicator placement.

use climate_common::{DisplayUnit, ValueRange};
use renderer::{Legend, Palette, TextRenderer};
use test_utils::{assert_approx_eq, require_test_font};

fn viridis() -> Palette {
    Palette::by_name("viridis").unwrap()
}

// ============================================================================
// Strip
// ============================================================================

#[test]
fn test_strip_runs_min_to_max() {
    let palette = viridis();
    let legend = Legend::build(
        &palette,
        &ValueRange::new(0.0, 10.0),
        &DisplayUnit::native("K"),
        false,
        200,
        12,
    )
    .unwrap();

    let strip = legend.strip();
    assert_eq!((strip.width(), strip.height()), (200, 12));

    let first = palette.at(0.0);
    let last = palette.at(1.0);
    let left = strip.pixel(0, 6).unwrap();
    let right = strip.pixel(199, 6).unwrap();
    assert_eq!((left.red(), left.green(), left.blue()), (first.r, first.g, first.b));
    assert_eq!((right.red(), right.green(), right.blue()), (last.r, last.g, last.b));
}

#[test]
fn test_zero_size_strip_is_error() {
    let result = Legend::build(
        &viridis(),
        &ValueRange::new(0.0, 1.0),
        &DisplayUnit::native("K"),
        false,
        0,
        10,
    );
    assert!(result.is_err());
}

// ============================================================================
// Ticks
// ============================================================================

#[test]
fn test_ticks_in_display_unit() {
    let unit = DisplayUnit::resolve("tas", Some("°C"));
    let legend = Legend::build(
        &viridis(),
        &ValueRange::new(263.15, 303.15),
        &unit,
        false,
        100,
        10,
    )
    .unwrap();

    let labels: Vec<&str> = legend.ticks().iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["-10.0", "10.0", "30.0"]);
    assert_eq!(legend.unit_label(), "°C");
}

#[test]
fn test_difference_ticks_skip_offset() {
    let unit = DisplayUnit::resolve("tas", Some("°C"));
    let range = ValueRange::new(-2.0, 4.0).symmetric();
    let legend = Legend::build(&Palette::by_name("diverging").unwrap(), &range, &unit, true, 100, 10)
        .unwrap();

    let labels: Vec<&str> = legend.ticks().iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["-4.0", "0.0", "4.0"]);
}

// ============================================================================
// Indicator
// ============================================================================

#[test]
fn test_indicator_fraction_clamped() {
    let legend = Legend::build(
        &viridis(),
        &ValueRange::new(10.0, 20.0),
        &DisplayUnit::native("K"),
        false,
        50,
        5,
    )
    .unwrap();
    assert_approx_eq!(legend.indicator_fraction(12.5), 0.25, 1e-12);
    assert_eq!(legend.indicator_fraction(-100.0), 0.0);
    assert_eq!(legend.indicator_fraction(100.0), 1.0);
}

#[test]
fn test_indicator_flat_range_is_centred() {
    let legend = Legend::build(
        &viridis(),
        &ValueRange::new(5.0, 5.0),
        &DisplayUnit::native("K"),
        false,
        50,
        5,
    )
    .unwrap();
    assert_eq!(legend.indicator_fraction(5.0), 0.5);
}

// ============================================================================
// Text
// ============================================================================

#[test]
fn test_tick_labels_draw_with_font() {
    let font_path = require_test_font!();
    let text = TextRenderer::load(&font_path).unwrap();

    let (w, h) = text.measure("273.1", 12.0);
    assert!(w > 0.0 && h > 0.0);

    let mut pixmap = tiny_skia::Pixmap::new(80, 20).unwrap();
    text.draw(&mut pixmap, "273.1", 2.0, 2.0, 12.0, renderer::Rgb::new(255, 255, 255));
    assert!(pixmap.data().chunks_exact(4).any(|p| p[3] > 0));
}
