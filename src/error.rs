//! Errors raised at the HTTP boundary.
//!
//! The core never fails; everything here is a caller-input problem rejected
//! before the flag store or guard is touched.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    UnknownFlag(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::InvalidBody(_) | Self::UnknownFlag(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = status.as_u16(), error = %self, "rejecting admin request");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

/// Reject missing or blank tenant identifiers.
pub fn require_tenant(tenant: Option<String>) -> Result<String, ApiError> {
    match tenant {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(ApiError::MissingField("tenant")),
    }
}
