//! Tests for label placement, border splitting and the one-shot overlay load.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use map_view::overlay::{place_labels, project_polyline, Label};
use map_view::{BaseMapOverlay, BorderSet, BorderSource, LabelSet, OverlayError, ViewportTransform};
use projection::ScreenProjection;
use test_utils::{assert_approx_eq, coarse_borders_json, fine_borders_json, labels_json};

const WORLD: (f64, f64) = (360.0, 180.0);
const VIEW: (f64, f64) = (360.0, 180.0);

fn fixed_measure(_: &str) -> (f64, f64) {
    (40.0, 10.0)
}

fn names(placed: &[map_view::overlay::PlacedLabel]) -> Vec<&str> {
    placed.iter().map(|p| p.name.as_str()).collect()
}

// ============================================================================
// Label placement
// ============================================================================

#[test]
fn test_priority_collision_and_zoom_gate() {
    let set = LabelSet::from_json(labels_json()).unwrap();
    let placed = place_labels(
        &set,
        ScreenProjection::Equirectangular,
        &ViewportTransform::default(),
        WORLD,
        VIEW,
        fixed_measure,
    );
    // Versailles collides with Paris; Lyon needs zoom 4
    assert_eq!(names(&placed), vec!["Paris", "Tokyo", "Fiji"]);
}

#[test]
fn test_zoom_gated_label_appears_when_zoomed_in() {
    let set = LabelSet::from_json(labels_json()).unwrap();
    // centre the view on Lyon at zoom 4
    let (wx, wy) = ScreenProjection::Equirectangular.project(4.84, 45.76, WORLD.0, WORLD.1);
    let t = ViewportTransform::new(4.0, wx * 4.0 - VIEW.0 / 2.0, wy * 4.0 - VIEW.1 / 2.0);
    let small = |_: &str| (10.0, 4.0);
    let placed = place_labels(&set, ScreenProjection::Equirectangular, &t, WORLD, VIEW, small);
    assert!(names(&placed).contains(&"Lyon"));
}

#[test]
fn test_label_uses_copy_nearest_view_centre() {
    let set = LabelSet::from_json(labels_json()).unwrap();
    let t = ViewportTransform::new(1.0, 190.0, 0.0);
    let placed = place_labels(&set, ScreenProjection::Equirectangular, &t, WORLD, VIEW, fixed_measure);

    let paris = placed.iter().find(|p| p.name == "Paris").unwrap();
    let fiji = placed.iter().find(|p| p.name == "Fiji").unwrap();
    assert_approx_eq!(paris.x, 352.35, 1e-9);
    assert_approx_eq!(fiji.x, 168.0, 1e-9);
}

#[test]
fn test_label_count_limited_by_zoom() {
    let labels: Vec<Label> = (0..100)
        .map(|i| Label {
            name: format!("place-{}", i),
            lon: -170.0 + (i % 10) as f64 * 34.0,
            lat: 70.0 - (i / 10) as f64 * 15.0,
            min_zoom: 0.0,
            priority: i,
        })
        .collect();
    let set = LabelSet::new(labels);
    let tiny = |_: &str| (4.0, 2.0);

    let at_one = place_labels(
        &set,
        ScreenProjection::Equirectangular,
        &ViewportTransform::default(),
        WORLD,
        VIEW,
        tiny,
    );
    assert_eq!(at_one.len(), 15);
    assert_eq!(at_one[0].name, "place-0");
}

#[test]
fn test_placed_labels_never_overlap() {
    let set = LabelSet::from_json(labels_json()).unwrap();
    let wide = |_: &str| (120.0, 14.0);
    let placed = place_labels(
        &set,
        ScreenProjection::Equirectangular,
        &ViewportTransform::default(),
        WORLD,
        VIEW,
        wide,
    );
    for (i, a) in placed.iter().enumerate() {
        for b in &placed[i + 1..] {
            assert!(!a.bounds.overlaps(&b.bounds), "{} overlaps {}", a.name, b.name);
        }
    }
}

// ============================================================================
// Borders
// ============================================================================

#[test]
fn test_fixture_borders_split_at_antimeridian() {
    let set = BorderSet::from_json(coarse_borders_json()).unwrap();
    let parts: Vec<_> = set
        .polylines
        .iter()
        .flat_map(|line| project_polyline(line, ScreenProjection::Equirectangular, WORLD.0, WORLD.1))
        .collect();
    // meridian segment stays whole, the crossing line splits in two
    assert_eq!(parts.len(), 3);
    for part in &parts {
        for pair in part.windows(2) {
            assert!((pair[1].0 - pair[0].0).abs() <= WORLD.0 / 2.0);
        }
    }
}

// ============================================================================
// One-shot loading
// ============================================================================

struct FixtureSource {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl BorderSource for FixtureSource {
    async fn coarse_borders(&self) -> Result<BorderSet, OverlayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(OverlayError::Fetch {
                resource: "coarse borders".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(BorderSet::from_json(coarse_borders_json())?)
    }

    async fn fine_borders(&self) -> Result<BorderSet, OverlayError> {
        Ok(BorderSet::from_json(fine_borders_json())?)
    }

    async fn labels(&self) -> Result<LabelSet, OverlayError> {
        Ok(LabelSet::from_json(labels_json())?)
    }
}

#[tokio::test]
async fn test_spawn_load_notifies_once() {
    let overlay = BaseMapOverlay::new();
    let source = Arc::new(FixtureSource {
        calls: AtomicUsize::new(0),
        fail: false,
    });
    let notified = Arc::new(AtomicUsize::new(0));

    let counter = notified.clone();
    overlay
        .spawn_load(source.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();
    assert!(overlay.is_loaded());
    assert_eq!(notified.load(Ordering::SeqCst), 1);

    let counter = notified.clone();
    overlay
        .spawn_load(source.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();
    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    let data = overlay.get().unwrap();
    assert_eq!(data.coarse.len(), 2);
    assert_eq!(data.fine.len(), 1);
    assert_eq!(data.labels.labels()[0].name, "Paris");
}

#[tokio::test]
async fn test_failed_load_can_be_retried() {
    let overlay = BaseMapOverlay::new();
    let broken = FixtureSource {
        calls: AtomicUsize::new(0),
        fail: true,
    };
    assert!(overlay.load(&broken).await.is_err());
    assert!(!overlay.is_loaded());

    let working = FixtureSource {
        calls: AtomicUsize::new(0),
        fail: false,
    };
    assert!(overlay.load(&working).await.unwrap());
    assert!(!overlay.load(&working).await.unwrap());
}

#[tokio::test]
async fn test_clones_share_the_cache() {
    let overlay = BaseMapOverlay::new();
    let clone = overlay.clone();
    let source = FixtureSource {
        calls: AtomicUsize::new(0),
        fail: false,
    };
    clone.load(&source).await.unwrap();
    assert!(overlay.is_loaded());
}
