// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`RegistryError`] to HTTP error responses.

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use custreg_core::types::now_timestamp;
use custreg_core::RegistryError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    /// Reason phrase of `status`.
    pub error: String,
    pub message: String,
    /// Request path that failed.
    pub path: String,
    pub timestamp: String,
}

/// A failed request: the error plus the path it happened on.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    path: String,
}

impl ApiError {
    pub fn new(err: RegistryError, uri: &Uri) -> Self {
        let path = uri.path().to_string();
        let (status, message) = match err {
            RegistryError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
            RegistryError::AlreadyExists(message) => (StatusCode::CONFLICT, message),
            RegistryError::BusinessRule { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
            RegistryError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            other => {
                error!(path = %path, error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected error occurred".to_string(),
                )
            }
        };
        if status.is_client_error() {
            warn!(path = %path, status = status.as_u16(), message = %message, "request rejected");
        }
        Self {
            status,
            message,
            path,
        }
    }

    /// A 400 for input that could not be parsed.
    pub fn bad_request(message: impl Into<String>, uri: &Uri) -> Self {
        Self::new(RegistryError::Validation(message.into()), uri)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message: self.message,
            path: self.path,
            timestamp: now_timestamp(),
        };
        (self.status, Json(body)).into_response()
    }
}
