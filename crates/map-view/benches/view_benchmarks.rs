//! Benchmarks for the map view - full render versus transform-only redraw.
//!
//! Run with: cargo bench --package map-view --bench view_benchmarks

use std::sync::Arc;

use climate_common::{DecodedGrid, DisplayUnit, GridGeometry, NumericBuffer, ValueRange};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use map_view::{
    BaseMapOverlay, BorderSet, LabelSet, MapView, MapViewConfig, OverlayData, PointerEvent,
    RasterLayer, ViewportTransform,
};
use renderer::Palette;
use test_utils::{coarse_borders_json, create_temperature_grid, fine_borders_json, grid, labels_json, viewport};

fn layer(generation: u64) -> RasterLayer {
    let (rows, cols) = grid::ONE_DEGREE;
    let g = DecodedGrid::new(
        NumericBuffer::F32(create_temperature_grid(rows, cols)),
        rows,
        cols,
        GridGeometry::default(),
    )
    .unwrap();
    let range = ValueRange::of_grid(&g).unwrap();
    RasterLayer {
        grid: Arc::new(g),
        generation,
        palette: Palette::by_name("viridis").unwrap(),
        range,
        unit: DisplayUnit::resolve("tas", Some("°C")),
        difference: false,
    }
}

fn desktop_view() -> MapView {
    let config = MapViewConfig {
        width: viewport::DESKTOP.0,
        height: viewport::DESKTOP.1,
        ..Default::default()
    };
    MapView::new(config).unwrap()
}

fn bench_render_vs_redraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_view");

    group.bench_function("full_render", |b| {
        let mut view = desktop_view();
        let mut generation = 0;
        b.iter(|| {
            generation += 1;
            view.set_layer(black_box(layer(generation))).unwrap()
        })
    });

    group.bench_function("wrapped_redraw", |b| {
        let mut view = desktop_view();
        view.set_layer(layer(1)).unwrap();
        view.set_transform(ViewportTransform::new(2.5, 733.3, 200.0));
        b.iter(|| {
            view.redraw();
        })
    });

    group.bench_function("redraw_with_borders", |b| {
        let overlay = BaseMapOverlay::new();
        overlay.install(OverlayData {
            coarse: BorderSet::from_json(coarse_borders_json()).unwrap(),
            fine: BorderSet::from_json(fine_borders_json()).unwrap(),
            labels: LabelSet::from_json(labels_json()).unwrap(),
        });
        let mut view = desktop_view().with_overlay(overlay);
        view.set_layer(layer(1)).unwrap();
        b.iter(|| {
            view.redraw();
        })
    });

    group.finish();
}

fn bench_pointer(c: &mut Criterion) {
    let mut view = desktop_view();
    view.set_layer(layer(1)).unwrap();

    c.bench_function("hover_lookup", |b| {
        b.iter(|| view.handle_pointer(black_box(PointerEvent::Move { x: 640.0, y: 320.0 })))
    });
}

criterion_group!(benches, bench_render_vs_redraw, bench_pointer);
criterion_main!(benches);
