//! reqwest client for `/data`, `/metadata`, `/health` and `/chat`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use climate_common::{ChatRequest, ChatResponse, DataRequest, Metadata, RasterPayload};
use metrics::{counter, histogram};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{ClientError, ClientResult};

/// Connection settings of an [`ApiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Liveness probes give up after this long
    pub health_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            health_timeout: Duration::from_secs(3),
        }
    }
}

/// The API surface the viewer depends on.
#[async_trait]
pub trait ClimateApi: Send + Sync {
    async fn data(&self, request: &DataRequest) -> ClientResult<RasterPayload>;

    async fn metadata(&self) -> ClientResult<Metadata>;

    /// `true` when the API answered 2xx within the health timeout.
    async fn health(&self) -> bool;

    async fn chat(&self, request: &ChatRequest) -> ClientResult<ChatResponse>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    health_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ClientError::InvalidResponse(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_timeout: config.health_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET any JSON document relative to the base URL.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.http.get(self.url(path)).send().await?;
        parse(check(response).await?).await
    }
}

#[async_trait]
impl ClimateApi for ApiClient {
    #[instrument(skip(self, request), fields(variable = %request.variable, model = %request.model, time = %request.time))]
    async fn data(&self, request: &DataRequest) -> ClientResult<RasterPayload> {
        let start = Instant::now();
        counter!("api_data_requests_total").increment(1);

        let result = async {
            let response = self.http.post(self.url("data")).json(request).send().await?;
            parse::<RasterPayload>(check(response).await?).await
        }
        .await;

        histogram!("api_data_request_seconds").record(start.elapsed().as_secs_f64());
        match &result {
            Ok(payload) => debug!(shape = ?payload.shape, dtype = %payload.dtype, "Received raster payload"),
            Err(e) => {
                counter!("api_data_errors_total").increment(1);
                warn!(error = %e, "Data request failed");
            }
        }
        result
    }

    async fn metadata(&self) -> ClientResult<Metadata> {
        self.get_json("metadata").await
    }

    async fn health(&self) -> bool {
        let request = self.http.get(self.url("health")).timeout(self.health_timeout);
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }

    async fn chat(&self, request: &ChatRequest) -> ClientResult<ChatResponse> {
        let response = self.http.post(self.url("chat")).json(request).send().await?;
        parse(check(response).await?).await
    }
}

/// Turn a non-2xx response into [`ClientError::Api`], keeping the server detail.
async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body,
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        detail,
    })
}

async fn parse<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
