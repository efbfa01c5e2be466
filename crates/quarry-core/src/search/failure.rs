//! Index-level failure classification

use thiserror::Error;

/// Failure talking to the external index
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchFailure {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("index returned HTTP {status}: {body}")]
    Response { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

impl SearchFailure {
    /// Classify a non-success HTTP response
    pub fn from_status(status: u16, body: String, index: &str) -> Self {
        match status {
            401 | 403 => SearchFailure::Authentication(format!("HTTP {}", status)),
            404 if body.contains("index_not_found") => {
                SearchFailure::IndexNotFound(index.to_string())
            }
            _ => SearchFailure::Response { status, body },
        }
    }
}

impl From<reqwest::Error> for SearchFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchFailure::Timeout(err.to_string())
        } else if err.is_connect() {
            SearchFailure::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            SearchFailure::from_status(status.as_u16(), err.to_string(), "")
        } else {
            SearchFailure::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchFailure {
    fn from(err: serde_json::Error) -> Self {
        SearchFailure::Other(format!("invalid response from index: {}", err))
    }
}
