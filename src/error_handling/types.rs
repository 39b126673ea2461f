//! Error type definitions.
//!
//! This module defines the client error taxonomy and the initialization and
//! submission errors built on top of it.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The configured backend URL cannot be parsed.
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL
        url: String,
        /// Parser message
        reason: String,
    },
}

/// Normalized failure of a call to the analysis backend.
///
/// Everything above the repository client branches on this type only; raw
/// transport errors and status codes never leak past
/// [`crate::api::ReportClient`]. The type is `Clone` so it can be stored in
/// poller snapshots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Input rejected locally; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend could not be reached or the connection broke.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered 404.
    #[error("Resource not found")]
    NotFound,

    /// The backend answered 4xx/5xx. `message` is the backend's detail when
    /// it sent one.
    #[error("{message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Human-readable detail
        message: String,
    },

    /// Anything that fits none of the other categories.
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ClientError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::NotFound => ErrorKind::NotFound,
            ClientError::Server { .. } => ErrorKind::Server,
            ClientError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

/// Flat category of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorKind {
    Validation,
    Network,
    NotFound,
    Server,
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation error",
            ErrorKind::Network => "Network error",
            ErrorKind::NotFound => "Not found",
            ErrorKind::Server => "Server error",
            ErrorKind::Unknown => "Unknown error",
        }
    }
}

/// Failure of one submission attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The URL failed the local scheme check; the backend was not called.
    #[error("{0}")]
    Validation(String),

    /// Another submission from the same controller is still in flight.
    #[error("A submission is already in progress")]
    Busy,

    /// The backend rejected the submission or could not be reached.
    #[error("Failed to start analysis: {0}")]
    Client(ClientError),
}

impl From<ClientError> for SubmitError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Validation(message) => SubmitError::Validation(message),
            other => SubmitError::Client(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_kind_as_str() {
        assert_eq!(ErrorKind::Network.as_str(), "Network error");
        assert_eq!(ErrorKind::NotFound.as_str(), "Not found");
        assert_eq!(ErrorKind::Server.to_string(), "Server error");
    }

    #[test]
    fn test_all_error_kinds_have_string_representation() {
        for kind in ErrorKind::iter() {
            assert!(
                !kind.as_str().is_empty(),
                "{:?} should have non-empty string",
                kind
            );
        }
    }

    #[test]
    fn test_client_error_kind_mapping() {
        assert_eq!(
            ClientError::Validation("bad".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ClientError::Network("refused".into()).kind(),
            ErrorKind::Network
        );
        assert_eq!(ClientError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            ClientError::Server {
                status: 500,
                message: "boom".into()
            }
            .kind(),
            ErrorKind::Server
        );
        assert_eq!(ClientError::Unknown("?".into()).kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_server_error_displays_backend_detail() {
        let error = ClientError::Server {
            status: 422,
            message: "invalid or missing URL scheme".into(),
        };
        assert_eq!(error.to_string(), "invalid or missing URL scheme");
    }

    #[test]
    fn test_submit_error_messages() {
        let error = SubmitError::Client(ClientError::Server {
            status: 500,
            message: "Internal server error".into(),
        });
        assert_eq!(
            error.to_string(),
            "Failed to start analysis: Internal server error"
        );
        assert_eq!(
            SubmitError::from(ClientError::Validation("URL is required".into())),
            SubmitError::Validation("URL is required".into())
        );
    }
}
