use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::product_client::LookupError;

/// Application-specific error types.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Caller-fixable input problem (missing fields, out-of-range values, bad barcode).
    Validation(String),
    /// The barcode has no matching product upstream.
    NotFound(String),
    /// The product source is unreachable or returned a non-success status.
    LookupUnavailable(String),
    /// Anything else. Logged in full, surfaced opaquely.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Strips any context wrappers and returns the underlying error.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for errors the caller can fix by changing the request.
    pub fn is_validation(&self) -> bool {
        matches!(self.root(), AppError::Validation(_) | AppError::NotFound(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::LookupUnavailable(msg) => write!(f, "Product lookup unavailable: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Validation-class errors carry their message back to the caller; lookup
    /// and internal failures are logged and replaced by a fixed message.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(msg) => {
                tracing::error!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::NotFound(msg) => {
                tracing::error!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::LookupUnavailable(msg) => {
                tracing::error!("Connection error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Failed to connect to product database".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Unexpected error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                tracing::debug!("Error context: {}", context);
                return source.clone().into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::InvalidInput(msg) => {
                AppError::Validation(format!("Invalid barcode format: {}", msg))
            }
            LookupError::NotFound(barcode) => {
                AppError::NotFound(format!("Product not found for barcode: {}", barcode))
            }
            LookupError::Unavailable(msg) => AppError::LookupUnavailable(msg),
        }
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: f(),
        })
    }
}
