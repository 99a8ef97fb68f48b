// src/error.rs
//! Error taxonomy for the gateway and its HTTP rendering.
//!
//! Every adapter failure ends up here so the router can answer with a
//! structured body instead of leaving the caller hanging.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network failure talking to the upstream (DNS, connect, body read).
    #[error("{provider}: upstream request failed: {error}")]
    Transport {
        provider: &'static str,
        #[source]
        error: reqwest::Error,
    },

    /// Upstream answered, but not with a 2xx.
    #[error("{provider}: upstream answered {status}")]
    UpstreamStatus {
        provider: &'static str,
        status: u16,
    },

    /// Body could not be unwrapped, or an item did not fit the adapter schema.
    #[error("{provider}: unexpected payload: {detail}")]
    Payload {
        provider: &'static str,
        detail: String,
    },

    /// The credential block for this source is absent or empty.
    #[error("{provider}: credentials are not configured")]
    MissingCredentials { provider: &'static str },

    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn payload(provider: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::Payload {
            provider,
            detail: detail.to_string(),
        }
    }

    /// Stable machine-readable kind, used in the response body and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "upstream_transport",
            Self::UpstreamStatus { .. } => "upstream_status",
            Self::Payload { .. } => "payload_shape",
            Self::MissingCredentials { .. } => "missing_credentials",
            Self::Config(_) => "config",
        }
    }

    pub fn provider(&self) -> Option<&'static str> {
        match self {
            Self::Transport { provider, .. }
            | Self::UpstreamStatus { provider, .. }
            | Self::Payload { provider, .. }
            | Self::MissingCredentials { provider } => Some(provider),
            Self::Config(_) => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Transport { .. } | Self::UpstreamStatus { .. } | Self::Payload { .. } => {
                StatusCode::BAD_GATEWAY
            }
            Self::MissingCredentials { .. } | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'static str>,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind(),
            source: self.provider(),
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
