//! TMDB client error types.

use marquee_core::FetchError;
use std::sync::Arc;

/// Errors from the TMDB client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TmdbError {
    /// Missing API key.
    #[error("missing API key: MARQUEE_TMDB_API_KEY not set")]
    MissingApiKey,

    /// Base URL could not be parsed or joined.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Blank search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Non-2xx response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Connection could not be established or was interrupted.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TmdbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TmdbError::Timeout
        } else if err.is_connect() || err.is_request() {
            TmdbError::Network(Arc::new(err))
        } else if err.is_decode() {
            TmdbError::Parse(err.to_string())
        } else {
            TmdbError::Other(err.to_string())
        }
    }
}

impl From<TmdbError> for FetchError {
    fn from(err: TmdbError) -> Self {
        match err {
            TmdbError::MissingApiKey | TmdbError::InvalidUrl(_) | TmdbError::InvalidQuery(_) => FetchError::InvalidRequest,
            TmdbError::Timeout | TmdbError::Network(_) => FetchError::Connectivity,
            TmdbError::HttpError { status } => FetchError::ServerError(status),
            TmdbError::Parse(detail) => FetchError::DecodeError(detail),
            TmdbError::Other(detail) => FetchError::Unknown(detail),
        }
    }
}
