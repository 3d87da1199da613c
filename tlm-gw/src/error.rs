//! Error types for tlm-gw
//!
//! Every failure reaches the client as `{"error": message}` with a status
//! matching its cause.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use tlm_common::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing or blank `query` (400)
    #[error("Search query must not be empty")]
    EmptyQuery,

    /// No source serves this media type (404)
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    /// Gateway not configured for this upstream (500)
    #[error("{0} credentials are not configured on the gateway")]
    MissingCredentials(&'static str),

    /// Upstream answered with a failure or could not be reached (502)
    #[error("{upstream} request failed: {message}")]
    Upstream {
        upstream: &'static str,
        message: String,
    },
}

impl GatewayError {
    pub fn upstream(upstream: &'static str, message: impl Into<String>) -> Self {
        GatewayError::Upstream {
            upstream,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::EmptyQuery => StatusCode::BAD_REQUEST,
            GatewayError::UnsupportedMedia(_) => StatusCode::NOT_FOUND,
            GatewayError::MissingCredentials(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
