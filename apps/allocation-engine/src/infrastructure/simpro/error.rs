//! simPRO-specific error types.

use thiserror::Error;

use crate::application::ports::RemoteError;

/// Errors from the simPRO adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimproError {
    /// Token exchange failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Request never produced a response, even after the retry.
    #[error("Network error calling {endpoint}: {message}")]
    Network {
        /// Path that was called.
        endpoint: String,
        /// Underlying error.
        message: String,
    },

    /// API answered with a non-success status.
    #[error("HTTP {status} from {endpoint}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Path that was called.
        endpoint: String,
        /// JSON body that was sent, if any.
        request_payload: Option<String>,
        /// Raw response body.
        body: String,
    },

    /// Response body did not have the expected shape.
    #[error("Unexpected response from {endpoint}: {message}")]
    JsonParse {
        /// Path that was called.
        endpoint: String,
        /// Parser message.
        message: String,
    },

    /// Adapter could not be built.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<SimproError> for RemoteError {
    fn from(err: SimproError) -> Self {
        match err {
            SimproError::Auth(message) => Self::Auth { message },
            SimproError::Network { endpoint, message } => Self::Transport { endpoint, message },
            SimproError::Status {
                status,
                endpoint,
                request_payload,
                body,
            } => Self::Rejected {
                status,
                endpoint,
                request_payload,
                response_body: body,
            },
            SimproError::JsonParse { endpoint, message } => Self::Decode { endpoint, message },
            SimproError::InvalidConfig(message) => Self::Auth { message },
        }
    }
}
