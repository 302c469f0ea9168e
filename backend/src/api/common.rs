//! Error handling utilities for API responses.
//!
//! Provides the error envelope returned by the REST endpoints and the
//! conversion from service-layer errors into HTTP responses. Node-side detail
//! is logged, never returned: every error class maps to a fixed message.
//!
//! # Response Format
//! All errors return consistent JSON responses containing:
//! - `message`: Human-readable message
//! - `error.error_type`: Machine-readable error category
//! - `error.details`: Optional field-specific validation errors
//!
//! LNURL endpoints do not use this envelope; the LNURL protocol requires its
//! own `{status, reason}` bodies.

use crate::errors::LightningError;
use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

/// Error envelope for REST endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Request timestamp
    pub timestamp: String,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
    /// Field-specific validation errors when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-specific validation error details
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the field with validation error
    pub field: String,
    /// Description of the validation failure
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

impl ApiResponse<()> {
    /// Create an error response
    pub fn error(
        message: impl Into<String>,
        error_type: impl Into<String>,
        details: Option<Vec<FieldError>>,
    ) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
                details,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Converts a LightningError into an opaque HTTP error.
///
/// `operation` names what failed ("adding invoice") and becomes both the
/// logged context and the public message.
pub fn lightning_error_to_http(error: LightningError, operation: &str) -> ApiError {
    tracing::error!("Error {}: {}", operation, error);
    let (status, error_type, message) = match error {
        LightningError::DecodeError(_) => (
            StatusCode::BAD_REQUEST,
            "invalid_payment_hash".to_string(),
            "Invalid payment hash".to_string(),
        ),
        LightningError::ValidationError(_) => (
            StatusCode::BAD_REQUEST,
            "validation_error".to_string(),
            "Bad request".to_string(),
        ),
        err if err.is_fatal() => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "node_unavailable".to_string(),
            format!("Error {}", operation),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}_error", operation.replace(' ', "_")),
            format!("Error {}", operation),
        ),
    };

    (status, Json(ApiResponse::error(message, error_type, None)))
}

/// Formats validator::ValidationErrors into field-specific error details
pub fn validation_errors_to_field_errors(errors: validator::ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .unwrap_or(&"Invalid value".into())
                    .to_string(),
            })
        })
        .collect()
}

/// Helper to create validation error response
pub fn validation_error_response(errors: validator::ValidationErrors) -> ApiError {
    let field_errors = validation_errors_to_field_errors(errors);
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(
            "Validation failed",
            "validation_error",
            Some(field_errors),
        )),
    )
}

/// Helper for bodies that could not be parsed at all
pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(message, "bad_request", None)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_is_opaque() {
        let (status, Json(body)) = lightning_error_to_http(
            LightningError::RemoteError("Unavailable: wallet locked at 10.0.0.4".to_string()),
            "adding invoice",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Error adding invoice");
        assert_eq!(body.error.unwrap().error_type, "adding_invoice_error");
        assert!(!body.success);
    }

    #[test]
    fn test_decode_error_is_client_error() {
        let (status, Json(body)) = lightning_error_to_http(
            LightningError::DecodeError("odd number of digits".to_string()),
            "fetching invoice",
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Invalid payment hash");
    }

    #[test]
    fn test_fatal_errors_are_opaque_server_errors() {
        let (status, Json(body)) = lightning_error_to_http(
            LightningError::ConnectionError("refused".to_string()),
            "getting address",
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.unwrap().error_type, "node_unavailable");
    }
}
