//! Request-level errors for the allocation engine.
//!
//! Per-line failures never surface here: they become failed
//! `AllocationResult`s. An `AllocationError` means the whole request could
//! not be processed.
//!
//! # HTTP Status Codes
//!
//! | Code | Status | Usage |
//! |------|--------|-------|
//! | `VALIDATION` | 400 | Malformed or empty request |
//! | `NOT_FOUND` | 404 | Purchase order not found |
//! | `AUTH` | 502 | Token exchange with the ERP failed |
//! | `TRANSPORT` | 502 | ERP unreachable after retry |
//! | `REMOTE_REJECTION` | 502 | ERP refused a read the request depends on |
//! | `DATA_INCONSISTENCY` | 502 | ERP answered with an unreadable body |
//! | `INTERNAL` | 500 | Anything else |

use std::collections::HashMap;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::RemoteError;
use crate::domain::allocation::{AllocationRequestError, RelocationRequestError};

/// Error codes for the allocation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Credential exchange failed.
    Auth,
    /// Network failure after the retry.
    Transport,
    /// The ERP answered with a non-success status.
    RemoteRejection,
    /// The ERP answered with data that could not be interpreted.
    DataInconsistency,
    /// Invalid request.
    Validation,
    /// Requested record does not exist.
    NotFound,
    /// Internal server error.
    Internal,
}

impl ErrorCode {
    /// Get the HTTP status for this error.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Auth | Self::Transport | Self::RemoteRejection | Self::DataInconsistency => {
                StatusCode::BAD_GATEWAY
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Auth => "AUTH",
            Self::Transport => "TRANSPORT",
            Self::RemoteRejection => "REMOTE_REJECTION",
            Self::DataInconsistency => "DATA_INCONSISTENCY",
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A request-level error with context.
#[derive(Debug, Error)]
pub struct AllocationError {
    /// Error code.
    code: ErrorCode,
    /// Human-readable message.
    message: String,
    /// Additional context (key-value pairs).
    context: Vec<(String, String)>,
}

impl AllocationError {
    /// Create a new allocation error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Convert to an HTTP error body.
    #[must_use]
    pub fn to_http_response(&self) -> HttpErrorResponse {
        HttpErrorResponse {
            error: self.message.clone(),
            code: self.code.reason().to_string(),
            details: self.context.iter().cloned().collect(),
        }
    }
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

/// HTTP error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Error code string.
    pub code: String,
    /// Additional details.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
}

/// Convenience constructors for common errors.
impl AllocationError {
    /// Invalid request.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Purchase order not found.
    #[must_use]
    pub fn po_not_found(po_number: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("PO #{po_number} not found"))
            .with_context("po_number", po_number)
    }

    /// Internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl From<RemoteError> for AllocationError {
    fn from(err: RemoteError) -> Self {
        let code = match &err {
            RemoteError::Auth { .. } => ErrorCode::Auth,
            RemoteError::Transport { .. } => ErrorCode::Transport,
            RemoteError::Rejected { .. } => ErrorCode::RemoteRejection,
            RemoteError::Decode { .. } => ErrorCode::DataInconsistency,
        };
        let mut error = Self::new(code, err.to_string());
        if let Some(endpoint) = err.endpoint() {
            error = error.with_context("endpoint", endpoint);
        }
        if let Some(status) = err.status() {
            error = error.with_context("status", status.to_string());
        }
        error
    }
}

impl From<AllocationRequestError> for AllocationError {
    fn from(err: AllocationRequestError) -> Self {
        let error = Self::validation(err.to_string());
        match err {
            AllocationRequestError::DuplicateCatalog { catalog_id } => {
                error.with_context("catalog_id", catalog_id.to_string())
            }
            AllocationRequestError::NoItems => error,
        }
    }
}

impl From<RelocationRequestError> for AllocationError {
    fn from(err: RelocationRequestError) -> Self {
        let error = Self::validation(err.to_string());
        match err {
            RelocationRequestError::SameDevice { storage_device_id } => {
                error.with_context("storage_device_id", storage_device_id.to_string())
            }
            RelocationRequestError::ZeroQuantity { catalog_id } => {
                error.with_context("catalog_id", catalog_id.to_string())
            }
            RelocationRequestError::MissingDevice | RelocationRequestError::NoItems => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::CatalogId;

    #[test]
    fn test_error_code_http_mapping() {
        assert_eq!(ErrorCode::Validation.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Auth.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorCode::Transport.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorCode::RemoteRejection.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::Internal.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rejection_carries_status_and_endpoint() {
        let error = AllocationError::from(RemoteError::Rejected {
            status: 503,
            endpoint: "/companies/0/vendorOrders/1/receipts/".to_string(),
            request_payload: None,
            response_body: String::new(),
        });
        assert_eq!(error.code(), ErrorCode::RemoteRejection);
        let response = error.to_http_response();
        assert_eq!(response.code, "REMOTE_REJECTION");
        assert_eq!(response.details.get("status").map(String::as_str), Some("503"));
        assert!(response.details.contains_key("endpoint"));
    }

    #[test]
    fn test_duplicate_catalog_is_validation() {
        let error = AllocationError::from(AllocationRequestError::DuplicateCatalog {
            catalog_id: CatalogId::new(12),
        });
        assert_eq!(error.code(), ErrorCode::Validation);
        assert_eq!(error.context(), &[("catalog_id".to_string(), "12".to_string())]);
    }

    #[test]
    fn test_same_device_relocation_is_validation() {
        let error = AllocationError::from(RelocationRequestError::SameDevice {
            storage_device_id: crate::domain::shared::StorageDeviceId::new(4),
        });
        assert_eq!(error.code(), ErrorCode::Validation);
        assert_eq!(error.message(), "Source and destination cannot be the same");
    }

    #[test]
    fn test_error_display() {
        let error = AllocationError::validation("Missing field");
        assert_eq!(error.to_string(), "[VALIDATION] Missing field");
        assert_eq!(error.message(), "Missing field");
    }
}
