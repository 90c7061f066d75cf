//! Base-map overlay data served next to the API.

use async_trait::async_trait;
use map_view::overlay::{BorderSet, BorderSource, LabelSet, OverlayError};
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ClientError;

pub const COARSE_BORDERS_PATH: &str = "borders/coarse.json";
pub const FINE_BORDERS_PATH: &str = "borders/fine.json";
pub const LABELS_PATH: &str = "labels.json";

/// Fetches border polylines and labels over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBorderSource {
    client: ApiClient,
    coarse_path: String,
    fine_path: String,
    labels_path: String,
}

impl HttpBorderSource {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            coarse_path: COARSE_BORDERS_PATH.to_string(),
            fine_path: FINE_BORDERS_PATH.to_string(),
            labels_path: LABELS_PATH.to_string(),
        }
    }

    pub fn with_paths(mut self, coarse: &str, fine: &str, labels: &str) -> Self {
        self.coarse_path = coarse.to_string();
        self.fine_path = fine.to_string();
        self.labels_path = labels.to_string();
        self
    }

    async fn fetch(&self, path: &str) -> Result<Value, OverlayError> {
        self.client
            .get_json::<Value>(path)
            .await
            .map_err(|e: ClientError| OverlayError::Fetch {
                resource: path.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl BorderSource for HttpBorderSource {
    async fn coarse_borders(&self) -> Result<BorderSet, OverlayError> {
        Ok(BorderSet::from_json(self.fetch(&self.coarse_path).await?)?)
    }

    async fn fine_borders(&self) -> Result<BorderSet, OverlayError> {
        Ok(BorderSet::from_json(self.fetch(&self.fine_path).await?)?)
    }

    async fn labels(&self) -> Result<LabelSet, OverlayError> {
        Ok(LabelSet::from_json(self.fetch(&self.labels_path).await?)?)
    }
}
