//! Platform client errors.

use thiserror::Error;

use crate::types::InvalidAmount;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("GraphQL error: {message}")]
    GraphQl { message: String, throttled: bool },

    #[error("rejected by platform: {}", .0.join(", "))]
    UserErrors(Vec<String>),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidAmount(#[from] InvalidAmount),

    #[error("invalid shop domain: {0}")]
    InvalidShop(String),

    #[error("response missing field: {0}")]
    MissingData(&'static str),
}

impl PlatformError {
    /// Whether a redelivery of the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PlatformError::Http(_) => true,
            PlatformError::Status { status, .. } => {
                *status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            PlatformError::GraphQl { throttled, .. } => *throttled,
            _ => false,
        }
    }
}
