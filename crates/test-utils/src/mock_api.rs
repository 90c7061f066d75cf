//! In-process stand-in for the climate data API.
//!
//! Serves `/health`, `/metadata`, `/data`, `/chat` and the base-map files
//! from fixtures on `127.0.0.1:0`, recording every `/data` body it receives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::fixtures;
use crate::generators;

#[derive(Default)]
struct MockState {
    default_data: Mutex<Value>,
    data_by_model: Mutex<HashMap<String, Value>>,
    data_error: Mutex<Option<(u16, String)>>,
    chat_reply: Mutex<Value>,
    healthy: AtomicBool,
    health_delay_ms: AtomicU64,
    data_delay_ms: AtomicU64,
    requests: Mutex<Vec<Value>>,
}

/// Configurable mock API. Cloning shares the underlying state, so a test can
/// change responses after the server has started.
#[derive(Clone)]
pub struct MockApi {
    state: Arc<MockState>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// Defaults: healthy, a 18x36 temperature field, a variable-switch chat reply.
    pub fn new() -> Self {
        let values = generators::create_temperature_grid(18, 36);
        let state = MockState {
            default_data: Mutex::new(generators::base64_payload("tas", 18, 36, &values)),
            chat_reply: Mutex::new(fixtures::chat_variable_reply()),
            healthy: AtomicBool::new(true),
            ..Default::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    pub fn with_data(self, payload: Value) -> Self {
        *self.state.default_data.lock().unwrap() = payload;
        self
    }

    /// Response used when the request's `model` matches.
    pub fn with_model_data(self, model: &str, payload: Value) -> Self {
        self.state
            .data_by_model
            .lock()
            .unwrap()
            .insert(model.to_string(), payload);
        self
    }

    /// Make `/data` fail with `{ "detail": ... }`.
    pub fn with_data_error(self, status: u16, detail: &str) -> Self {
        self.set_data_error(Some((status, detail.to_string())));
        self
    }

    pub fn set_data_error(&self, error: Option<(u16, String)>) {
        *self.state.data_error.lock().unwrap() = error;
    }

    pub fn with_chat_reply(self, reply: Value) -> Self {
        *self.state.chat_reply.lock().unwrap() = reply;
        self
    }

    pub fn unhealthy(self) -> Self {
        self.state.healthy.store(false, Ordering::SeqCst);
        self
    }

    pub fn with_health_delay(self, delay: Duration) -> Self {
        self.state
            .health_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
        self
    }

    pub fn with_data_delay(self, delay: Duration) -> Self {
        self.state
            .data_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
        self
    }

    /// `/data` bodies received so far, oldest first.
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Build the router without binding a socket.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/metadata", get(metadata_handler))
            .route("/data", post(data_handler))
            .route("/chat", post(chat_handler))
            .route("/borders/coarse.json", get(coarse_borders_handler))
            .route("/borders/fine.json", get(fine_borders_handler))
            .route("/labels.json", get(labels_handler))
            .layer(Extension(self.state.clone()))
    }

    /// Bind to an ephemeral port and serve in the background.
    pub async fn spawn(self) -> MockServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock API");
        let addr = listener.local_addr().expect("Mock API has no local address");
        let app = self.router();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        MockServer {
            base_url: format!("http://{}", addr),
            api: self,
            handle,
        }
    }
}

/// A running mock API. The server stops when this is dropped.
pub struct MockServer {
    pub base_url: String,
    pub api: MockApi,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

async fn health_handler(Extension(state): Extension<Arc<MockState>>) -> impl IntoResponse {
    sleep_ms(state.health_delay_ms.load(Ordering::SeqCst)).await;
    if state.healthy.load(Ordering::SeqCst) {
        (StatusCode::OK, Json(json!({"status": "healthy"})))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "unavailable"})),
        )
    }
}

async fn metadata_handler() -> impl IntoResponse {
    Json(fixtures::metadata_json())
}

async fn data_handler(
    Extension(state): Extension<Arc<MockState>>,
    Json(request): Json<Value>,
) -> impl IntoResponse {
    state.requests.lock().unwrap().push(request.clone());
    sleep_ms(state.data_delay_ms.load(Ordering::SeqCst)).await;

    let error = state.data_error.lock().unwrap().clone();
    if let Some((status, detail)) = error {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!({ "detail": detail })));
    }

    let by_model = request["model"]
        .as_str()
        .and_then(|model| state.data_by_model.lock().unwrap().get(model).cloned());
    let mut payload = by_model.unwrap_or_else(|| state.default_data.lock().unwrap().clone());
    for key in ["variable", "model", "scenario", "time"] {
        if !request[key].is_null() {
            payload[key] = request[key].clone();
        }
    }
    (StatusCode::OK, Json(payload))
}

async fn chat_handler(
    Extension(state): Extension<Arc<MockState>>,
    Json(_request): Json<Value>,
) -> impl IntoResponse {
    Json(state.chat_reply.lock().unwrap().clone())
}

async fn coarse_borders_handler() -> impl IntoResponse {
    Json(fixtures::coarse_borders_json())
}

async fn fine_borders_handler() -> impl IntoResponse {
    Json(fixtures::fine_borders_json())
}

async fn labels_handler() -> impl IntoResponse {
    Json(fixtures::labels_json())
}
