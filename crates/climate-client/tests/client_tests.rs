//! Tests for the API client against the in-process mock API.

use std::time::Duration;

use climate_client::{ApiClient, ClientConfig, ClientError, ClimateApi, HttpBorderSource};
use climate_common::{decode_grid, ChatMessage, ChatRequest, DataRequest, GridGeometry};
use map_view::BaseMapOverlay;
use test_utils::{chat_compare_reply, MockApi};

// ============================================================================
// Helpers
// ============================================================================

fn client_for(base_url: &str) -> ApiClient {
    ApiClient::new(ClientConfig {
        base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        health_timeout: Duration::from_millis(200),
    })
    .unwrap()
}

fn tas_request() -> DataRequest {
    DataRequest::new("tas", "2050-07-01", "ACCESS-CM2", Some("ssp245"))
}

// ============================================================================
// /data
// ============================================================================

#[tokio::test]
async fn test_data_round_trip_decodes() {
    let server = MockApi::new().spawn().await;
    let client = client_for(&server.base_url);

    let payload = client.data(&tas_request()).await.unwrap();
    assert_eq!(payload.shape, vec![18, 36]);
    assert_eq!(payload.model, "ACCESS-CM2");

    let grid = decode_grid(&payload, &GridGeometry::default()).unwrap().unwrap();
    assert_eq!((grid.rows(), grid.cols()), (18, 36));

    let requests = server.api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["variable"], "tas");
    assert_eq!(requests[0]["resolution"], "medium");
    assert_eq!(requests[0]["data_format"], "base64");
}

#[tokio::test]
async fn test_data_error_carries_status_and_detail() {
    let server = MockApi::new()
        .with_data_error(422, "Invalid scenario: ssp999")
        .spawn()
        .await;
    let client = client_for(&server.base_url);

    let err = client.data(&tas_request()).await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    match err {
        ClientError::Api { detail, .. } => assert_eq!(detail, "Invalid scenario: ssp999"),
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_data_timeout() {
    let server = MockApi::new()
        .with_data_delay(Duration::from_millis(500))
        .spawn()
        .await;
    let client = ApiClient::new(ClientConfig {
        base_url: server.base_url.clone(),
        request_timeout: Duration::from_millis(100),
        ..Default::default()
    })
    .unwrap();

    let err = client.data(&tas_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_api() {
    // bind and release a port so nothing is listening on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}", addr));
    let err = client.data(&tas_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::Unreachable(_)), "got {:?}", err);
    assert!(!client.health().await);
}

// ============================================================================
// /health, /metadata, /chat
// ============================================================================

#[tokio::test]
async fn test_health() {
    let healthy = MockApi::new().spawn().await;
    assert!(client_for(&healthy.base_url).health().await);

    let unhealthy = MockApi::new().unhealthy().spawn().await;
    assert!(!client_for(&unhealthy.base_url).health().await);
}

#[tokio::test]
async fn test_slow_health_is_unavailable() {
    let server = MockApi::new()
        .with_health_delay(Duration::from_secs(2))
        .spawn()
        .await;
    let client = client_for(&server.base_url);

    let start = std::time::Instant::now();
    assert!(!client.health().await);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_metadata() {
    let server = MockApi::new().spawn().await;
    let metadata = client_for(&server.base_url).metadata().await.unwrap();
    assert!(metadata.models.contains(&"MIROC6".to_string()));
    assert_eq!(metadata.unit_of("tas"), Some("K"));
    assert_eq!(metadata.time_range.historical_end.as_deref(), Some("2014-12-31"));
}

#[tokio::test]
async fn test_chat() {
    let server = MockApi::new().with_chat_reply(chat_compare_reply()).spawn().await;
    let client = client_for(&server.base_url);

    let request = ChatRequest {
        message: "compare ACCESS-CM2 with MIROC6".to_string(),
        context: None,
        history: vec![ChatMessage::user("hello")],
    };
    let reply = client.chat(&request).await.unwrap();
    assert!(reply.success);
    assert_eq!(reply.new_state.unwrap()["model2"], "MIROC6");
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let server = MockApi::new().spawn().await;
    let client = client_for(&format!("{}/", server.base_url));
    assert!(client.health().await);
}

// ============================================================================
// Overlay over HTTP
// ============================================================================

#[tokio::test]
async fn test_http_border_source_loads_overlay() {
    let server = MockApi::new().spawn().await;
    let source = HttpBorderSource::new(client_for(&server.base_url));
    let overlay = BaseMapOverlay::new();

    assert!(overlay.load(&source).await.unwrap());
    let data = overlay.get().unwrap();
    assert_eq!(data.coarse.len(), 2);
    assert_eq!(data.fine.len(), 1);
    assert_eq!(data.labels.len(), 5);
}

#[tokio::test]
async fn test_missing_overlay_file_is_a_fetch_error() {
    let server = MockApi::new().spawn().await;
    let source = HttpBorderSource::new(client_for(&server.base_url)).with_paths(
        "borders/missing.json",
        "borders/fine.json",
        "labels.json",
    );
    let overlay = BaseMapOverlay::new();

    let err = overlay.load(&source).await.unwrap_err();
    assert!(err.to_string().contains("borders/missing.json"));
    assert!(!overlay.is_loaded());
}
