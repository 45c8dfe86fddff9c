use axum::{
    Json,
    extract::rejection::{BytesRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ErrorResponse;

/// Failures raised by a [`KeyValueStore`](crate::kv::KeyValueStore) backend.
#[derive(Error, Debug)]
pub enum KvError {
    #[error("libsql error")]
    Libsql(#[from] libsql::Error),

    #[error("object storage error")]
    ObjectStorage(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error("value stored under {key} is not valid UTF-8")]
    Encoding { key: String },
}

#[derive(Error, Debug)]
pub enum PinError {
    #[error("{reason}")]
    Validation {
        reason: String,
        details: Option<String>,
    },

    #[error("key-value store failure")]
    Store(#[from] KvError),

    #[error("pin list stored under {key} is corrupt")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode pin list")]
    Encode(#[source] serde_json::Error),
}

impl PinError {
    pub fn validation(reason: &str) -> Self {
        PinError::Validation {
            reason: reason.to_string(),
            details: None,
        }
    }

    pub fn validation_with(reason: &str, details: impl std::fmt::Display) -> Self {
        PinError::Validation {
            reason: reason.to_string(),
            details: Some(details.to_string()),
        }
    }
}

/// Error returned by the HTTP handlers. Always renders the JSON envelope.
#[derive(Debug)]
pub enum ApiError {
    BadRequest {
        error: String,
        details: Option<String>,
    },
    Internal {
        error: String,
        details: Option<String>,
    },
    Timeout,
}

impl ApiError {
    pub fn bad_request(error: &str, details: impl std::fmt::Display) -> Self {
        ApiError::BadRequest {
            error: error.to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn internal(error: &str) -> Self {
        ApiError::Internal {
            error: error.to_string(),
            details: None,
        }
    }
}

impl From<PinError> for ApiError {
    fn from(err: PinError) -> Self {
        match err {
            PinError::Validation { reason, details } => ApiError::BadRequest {
                error: reason,
                details,
            },
            other => {
                tracing::error!(error = %crate::unpack_error(&other), "pin store failure");
                ApiError::Internal {
                    error: "Internal server error".to_string(),
                    details: Some(crate::unpack_error(&other)),
                }
            }
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request("Invalid path", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("Invalid query string", rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        ApiError::bad_request("Could not read request body", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest { error, details } => (StatusCode::BAD_REQUEST, error, details),
            ApiError::Internal { error, details } => {
                (StatusCode::INTERNAL_SERVER_ERROR, error, details)
            }
            ApiError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "Request timed out".to_string(),
                None,
            ),
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}
