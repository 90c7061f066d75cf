//! Error types for calls to the climate data API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx response; `detail` is the server's `{"detail": ...}` text when present
    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// HTTP status of the failed response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for the dismissable error overlay.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { status: 422, detail } => format!("Invalid request: {}", detail),
            ClientError::Api { status: 502, detail } => format!("Data could not be loaded: {}", detail),
            ClientError::Api { detail, .. } => detail.clone(),
            ClientError::Timeout(_) => "The climate API did not respond in time".to_string(),
            ClientError::Unreachable(_) => "The climate API is unavailable".to_string(),
            ClientError::InvalidResponse(msg) => format!("Unexpected response from the API: {}", msg),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(e.to_string())
        } else if e.is_connect() || e.is_request() {
            ClientError::Unreachable(e.to_string())
        } else if let Some(status) = e.status() {
            ClientError::Api {
                status: status.as_u16(),
                detail: e.to_string(),
            }
        } else {
            ClientError::InvalidResponse(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::InvalidResponse(e.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
