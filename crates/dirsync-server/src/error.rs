//! Error types for dirsync-server

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Result type for dirsync-server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while applying sync requests
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request was structurally invalid; nothing was changed
    #[error("{message}")]
    Validation { message: String },

    /// Content on disk does not hash to the declared value
    #[error("Content of '{path}' is corrupt: expected hash {expected}, got {actual}")]
    Corrupt {
        path: String,
        expected: String,
        actual: String,
    },

    /// A metadata-only transfer named a hash the server has no content for
    #[error("No content known for hash {hash}")]
    MissingSource { hash: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Request task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Core(#[from] dirsync_core::Error),

    #[error(transparent)]
    Store(#[from] dirsync_store::Error),

    #[error(transparent)]
    Fs(#[from] dirsync_fs::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::Core(dirsync_core::Error::Validation { .. })
            | Self::Fs(dirsync_fs::Error::InvalidPath { .. }) => StatusCode::BAD_REQUEST,
            Self::Corrupt { .. } | Self::MissingSource { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response rendered as `{"error": {"message", "status"}}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        } else {
            tracing::warn!(error = %err, status = status.as_u16(), "Request rejected");
        }
        Self::new(status, err.to_string())
    }
}
