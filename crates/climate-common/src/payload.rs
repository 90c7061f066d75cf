//! Request and response shapes of the climate data API.
//!
//! These mirror the JSON bodies of `POST /data`, `GET /metadata` and
//! `POST /chat`. The raster itself stays encoded here; see [`crate::decode`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Spatial resolution level requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Low,
    #[default]
    Medium,
    High,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Low => "low",
            Resolution::Medium => "medium",
            Resolution::High => "high",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the API should serialize the array payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataEncoding {
    #[default]
    Base64,
    List,
    None,
}

/// Body of `POST /data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRequest {
    pub variable: String,
    /// ISO date (YYYY-MM-DD)
    pub time: String,
    pub model: String,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub data_format: DataEncoding,
}

impl DataRequest {
    pub fn new(variable: &str, time: &str, model: &str, scenario: Option<&str>) -> Self {
        Self {
            variable: variable.to_string(),
            time: time.to_string(),
            model: model.to_string(),
            scenario: scenario.map(str::to_string),
            resolution: Resolution::default(),
            data_format: DataEncoding::default(),
        }
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }
}

/// The encoded `data` field of a raster payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadData {
    /// Base64-wrapped native-endian float buffer
    Encoded(String),
    /// Nested numeric lists in row-major order
    Values(Vec<serde_json::Value>),
}

/// Result of a data request (`POST /data`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterPayload {
    pub variable: String,
    pub model: String,
    #[serde(default)]
    pub scenario: Option<String>,
    /// ISO date string
    pub time: String,
    /// [rows, cols]
    pub shape: Vec<usize>,
    pub dtype: String,
    #[serde(default)]
    pub data: Option<PayloadData>,
    #[serde(default)]
    pub data_encoding: Option<DataEncoding>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub resolution: Option<Resolution>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub quality: Option<i32>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub metadata: Option<PayloadMetadata>,
    /// "0-360" or "-180-180"; falls back to the viewer default
    #[serde(default)]
    pub lon_convention: Option<String>,
    /// [north, south] in degrees; falls back to the viewer default
    #[serde(default)]
    pub lat_extent: Option<[f64; 2]>,
}

impl RasterPayload {
    /// Rows and columns declared by the payload, if the shape is 2-D.
    pub fn dims(&self) -> Option<(usize, usize)> {
        match self.shape.as_slice() {
            [rows, cols] => Some((*rows, *cols)),
            _ => None,
        }
    }

    /// The effective encoding: explicit when present, else inferred from `data`.
    pub fn encoding(&self) -> DataEncoding {
        if let Some(encoding) = self.data_encoding {
            return encoding;
        }
        match &self.data {
            None => DataEncoding::None,
            Some(PayloadData::Encoded(_)) => DataEncoding::Base64,
            Some(PayloadData::Values(_)) => DataEncoding::List,
        }
    }
}

/// Display metadata attached to a payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PayloadMetadata {
    #[serde(default)]
    pub variable: Option<VariableMetadata>,
    #[serde(default)]
    pub scenario: Option<ScenarioMetadata>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariableMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioMetadata {
    #[serde(default)]
    pub period: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

/// Valid date range of the whole catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub historical_end: Option<String>,
    #[serde(default)]
    pub projection_start: Option<String>,
}

/// Body of `GET /metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub variables: Vec<String>,
    pub models: Vec<String>,
    pub scenarios: Vec<String>,
    #[serde(default)]
    pub resolutions: Vec<String>,
    #[serde(default)]
    pub variable_metadata: HashMap<String, VariableMetadata>,
    #[serde(default)]
    pub scenario_metadata: HashMap<String, ScenarioMetadata>,
    pub time_range: TimeRange,
}

impl Metadata {
    /// Native unit of a variable, if the catalogue knows it.
    pub fn unit_of(&self, variable: &str) -> Option<&str> {
        self.variable_metadata
            .get(variable)
            .map(|m| m.unit.as_str())
            .filter(|u| !u.is_empty())
    }
}

/// One turn of chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Response of `POST /chat`.
///
/// `new_state` stays untyped at this boundary; it is validated into
/// [`crate::state::StatePatch`] values before it touches the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub success: bool,
    #[serde(default)]
    pub new_state: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_request_defaults() {
        let json = r#"{"variable": "tas", "time": "2020-01-01", "model": "ACCESS-CM2"}"#;
        let request: DataRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.resolution, Resolution::Medium);
        assert_eq!(request.data_format, DataEncoding::Base64);
        assert!(request.scenario.is_none());
    }

    #[test]
    fn test_payload_encoding_inferred() {
        let json = r#"{
            "variable": "tas", "model": "CESM2", "time": "2020-01-01",
            "shape": [2, 2], "dtype": "float32", "data": [[1, 2], [3, 4]]
        }"#;
        let payload: RasterPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.encoding(), DataEncoding::List);
        assert_eq!(payload.dims(), Some((2, 2)));
    }

    #[test]
    fn test_payload_null_data() {
        let json = r#"{
            "variable": "tas", "model": "CESM2", "time": "2020-01-01",
            "shape": [600, 1440], "dtype": "float32", "data": null, "data_encoding": "none"
        }"#;
        let payload: RasterPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.encoding(), DataEncoding::None);
        assert!(payload.data.is_none());
    }

    #[test]
    fn test_chat_response_without_state() {
        let json = r#"{"message": "Hallo", "success": true}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert!(response.new_state.is_none());
    }
}
