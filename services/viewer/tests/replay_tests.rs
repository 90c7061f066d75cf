//! Replay of scripted sessions: debounced slider commits and frame output.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use climate_client::{ApiClient, ClientConfig};
use climate_common::ViewState;
use climate_viewer::{LoadStatus, ReplayScript, Replayer, Session, ViewerConfig};
use map_view::{MapView, MapViewConfig, TooltipUpdate};
use test_utils::{viewport, MockApi, MockServer};

// ============================================================================
// Helpers
// ============================================================================

async fn session_for(api: MockApi) -> (MockServer, Session) {
    let server = api.spawn().await;
    let client = ApiClient::new(ClientConfig {
        base_url: server.base_url.clone(),
        ..Default::default()
    })
    .unwrap();
    let view = MapView::new(MapViewConfig {
        width: viewport::SMALL.0,
        height: viewport::SMALL.1,
        ..Default::default()
    })
    .unwrap();
    let date = NaiveDate::from_ymd_opt(2050, 7, 1).unwrap();
    let state = ViewState::new("tas", "ACCESS-CM2", "ssp245", date);
    let mut session = Session::new(Arc::new(client), view, state).unwrap();
    assert!(session.load().await.is_ready());
    (server, session)
}

// ============================================================================
// Slider debouncing
// ============================================================================

#[tokio::test]
async fn test_rapid_slider_ticks_commit_once() {
    let (server, mut session) = session_for(MockApi::new()).await;
    let steps = ReplayScript::from_yaml(
        r#"
steps:
  - slider: "2050-08-01"
  - slider: "2050-09-01"
  - slider: "2050-10-01"
"#,
    )
    .unwrap();

    let mut replayer = Replayer::new(Duration::from_millis(50));
    let report = replayer.run(&mut session, &steps).await.unwrap();

    assert_eq!(report.steps, 3);
    assert_eq!(report.loads.len(), 1);
    assert!(report.loads[0].is_ready());
    assert!(report.errors.is_empty());
    assert_eq!(
        session.state().mode.current_date(),
        NaiveDate::from_ymd_opt(2050, 10, 1).unwrap()
    );

    let requests = server.api.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1]["time"], "2050-10-01");
}

#[tokio::test]
async fn test_spaced_slider_ticks_each_commit() {
    let (server, mut session) = session_for(MockApi::new()).await;
    let steps = ReplayScript::from_yaml(
        r#"
steps:
  - slider: "2050-08-01"
  - wait_ms: 150
  - slider: "2050-09-01"
  - wait_ms: 150
"#,
    )
    .unwrap();

    let mut replayer = Replayer::new(Duration::from_millis(50));
    let report = replayer.run(&mut session, &steps).await.unwrap();

    assert_eq!(report.loads.len(), 2);
    assert_eq!(server.api.requests().len(), 3);
}

#[tokio::test]
async fn test_failed_commit_is_reported() {
    let (server, mut session) = session_for(MockApi::new()).await;
    server.api.set_data_error(Some((502, "upstream store offline".to_string())));
    let steps = ReplayScript::from_yaml("steps:\n  - slider: \"2050-08-01\"\n  - wait_ms: 150\n").unwrap();

    let mut replayer = Replayer::new(Duration::from_millis(50));
    let report = replayer.run(&mut session, &steps).await.unwrap();

    match &report.loads[..] {
        [LoadStatus::Failed(message)] => assert!(message.contains("upstream store offline")),
        other => panic!("unexpected loads {:?}", other),
    }
    assert!(session.view().has_raster());
}

// ============================================================================
// Pointer, patches and frames
// ============================================================================

#[tokio::test]
async fn test_pointer_steps_record_tooltips() {
    let (_server, mut session) = session_for(MockApi::new()).await;
    let steps = ReplayScript::from_yaml(
        r#"
steps:
  - pointer: { type: move, x: 100, y: 60 }
  - pointer: { type: leave }
"#,
    )
    .unwrap();

    let mut replayer = Replayer::new(Duration::from_millis(50));
    let report = replayer.run(&mut session, &steps).await.unwrap();

    assert_eq!(report.tooltips.len(), 2);
    assert!(matches!(report.tooltips[0], TooltipUpdate::Show { .. }));
    assert_eq!(report.tooltips[1], TooltipUpdate::Hide);
}

#[tokio::test]
async fn test_invalid_patch_is_recorded_not_fatal() {
    let (_server, mut session) = session_for(MockApi::new()).await;
    let steps = ReplayScript::from_yaml(
        r#"
steps:
  - patch: { colorPalette: magma }
  - patch: { canvasView: Chart }
  - resize: { width: 0, height: 10 }
"#,
    )
    .unwrap();

    let mut replayer = Replayer::new(Duration::from_millis(50));
    let report = replayer.run(&mut session, &steps).await.unwrap();

    assert_eq!(report.steps, 3);
    assert_eq!(report.errors.len(), 2);
    assert_eq!(session.state().palette, "magma");
    assert!(session.view().has_raster());
}

#[tokio::test]
async fn test_frames_written_per_step() {
    let (_server, mut session) = session_for(MockApi::new()).await;
    let steps = ReplayScript::from_yaml(
        r#"
steps:
  - pointer: { type: wheel, x: 180, y: 90, delta_y: -1 }
  - slider: "2050-08-01"
"#,
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("frames");

    let mut replayer = Replayer::new(Duration::from_millis(50)).with_out_dir(&out_dir);
    let report = replayer.run(&mut session, &steps).await.unwrap();

    // One frame per step plus one after the trailing slider commit
    assert_eq!(report.frames.len(), 3);
    for frame in &report.frames {
        let bytes = std::fs::read(frame).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
    assert!(out_dir.join("frame_002.png").exists());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("viewer.yaml");
    std::fs::write(
        &path,
        r#"
map:
  width: 640
  height: 320
  palette: cividis
slider:
  debounce_ms: 120
defaults:
  variable: pr
  scenario: SSP585
  date: "2080-01-15"
"#,
    )
    .unwrap();

    let config = ViewerConfig::load(&path).unwrap();
    assert_eq!(config.map.width, 640);
    assert_eq!(config.slider.debounce(), Duration::from_millis(120));

    let state = config.initial_state().unwrap();
    assert_eq!(state.variable, "pr");
    assert_eq!(state.palette, "cividis");
    assert_eq!(state.mode.current_scenario(), Some("ssp585"));
}

#[test]
fn test_config_rejects_unknown_palette() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("viewer.yaml");
    std::fs::write(&path, "map:\n  palette: rainbow\n").unwrap();
    assert!(ViewerConfig::load(&path).is_err());
}

#[test]
fn test_sample_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/viewer.yaml");
    let config = ViewerConfig::load(&path).unwrap();
    assert_eq!(config.defaults.model, "ACCESS-CM2");

    let script = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/session.yaml");
    assert!(!ReplayScript::load(&script).unwrap().is_empty());
}
