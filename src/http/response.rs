//! Error responses.
//!
//! # Responsibilities
//! - Map dispatch failures to HTTP status codes
//!
//! # Design Decisions
//! - Response bodies are short fixed strings; details go to the log
//! - Backend timeouts result in 504 Gateway Timeout

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::forward::ForwardError;

/// Why a request could not be proxied.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches path {0:?}")]
    NoRoute(String),

    #[error("service {0:?} has no backend available")]
    NoBackend(String),

    #[error("forwarding to {backend} failed: {source}")]
    Forward {
        backend: String,
        #[source]
        source: ForwardError,
    },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NoRoute(_) => StatusCode::NOT_FOUND,
            DispatchError::NoBackend(_) => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Forward {
                source: ForwardError::Timeout(_),
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            DispatchError::Forward { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let message = match self.status() {
            StatusCode::NOT_FOUND => "No matching route found",
            StatusCode::SERVICE_UNAVAILABLE => "No backend available",
            StatusCode::GATEWAY_TIMEOUT => "Upstream timed out",
            _ => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}
