//! Unified error types for marquee.
//!
//! `Error` covers the cache, configuration and input validation. Failures of
//! the remote fetch collaborator use [`FetchError`], which is what a session
//! reports in its `Error` status.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::rusqlite;

/// Unified error types for the marquee core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No cache entry exists for the normalized query.
    ///
    /// Only used while resolving a fallback; sessions report the original
    /// fetch failure instead.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Configuration could not be loaded or is invalid.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The dispatcher task is gone.
    #[error("DISPATCHER_CLOSED")]
    DispatcherClosed,
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Config(e) => (-32003, e.to_string()),
            Error::DispatcherClosed => (-32004, "search dispatcher is not running".to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

/// Failure of a single remote fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    /// The request could not be built (bad URL, empty query).
    #[error("invalid request")]
    InvalidRequest,

    /// No route to the endpoint: offline, connection refused or timed out.
    #[error("connectivity failure")]
    Connectivity,

    /// The endpoint answered with a non-success status.
    #[error("server error: status {0}")]
    ServerError(u16),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl FetchError {
    /// Whether the failure is due to network connectivity.
    ///
    /// Connectivity failures fall back to cached results on every page.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, FetchError::Connectivity)
    }

    /// User-facing message for this failure.
    pub fn message(&self) -> String {
        match self {
            FetchError::InvalidRequest => "Invalid request URL.".to_string(),
            FetchError::Connectivity => "No internet connection. Please check your network settings.".to_string(),
            FetchError::ServerError(code) => format!("Server error (code: {code}). Please try again later."),
            FetchError::DecodeError(detail) => format!("Failed to process response: {detail}"),
            FetchError::Unknown(detail) => format!("An unexpected error occurred: {detail}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("bat".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("bat"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::InvalidInput("query cannot be empty".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_only_connectivity_is_connectivity() {
        assert!(FetchError::Connectivity.is_connectivity());
        assert!(!FetchError::InvalidRequest.is_connectivity());
        assert!(!FetchError::ServerError(500).is_connectivity());
        assert!(!FetchError::DecodeError("eof".into()).is_connectivity());
        assert!(!FetchError::Unknown("?".into()).is_connectivity());
    }

    #[test]
    fn test_fetch_error_messages() {
        assert!(FetchError::ServerError(503).message().contains("503"));
        assert!(FetchError::DecodeError("missing field".into()).message().contains("missing field"));
        assert!(FetchError::Connectivity.message().contains("internet"));
    }
}
