//! Error Types
//!
//! One error enum shared by the task, inference and similarity clients.

use thiserror::Error;

/// Longest slice of a response body kept in a status error.
const MAX_BODY_IN_ERROR: usize = 500;

/// Main error type for ailab client operations
#[derive(Debug, Error)]
pub enum AilabError {
    /// A caller-supplied argument is unusable (e.g. an empty API key)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request could not be sent or its body could not be read
    #[error("Request failed: {0}")]
    Request(String),

    /// The request exceeded its timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The server answered with a non-2xx status
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// A response body or stream frame was not valid JSON
    #[error("Decode error: {0}")]
    Decode(String),

    /// The event stream carried bytes that are not valid text
    #[error("Streaming error: {0}")]
    Stream(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AilabError {
    /// Build a status error, keeping at most the first few hundred bytes of the body.
    pub fn status(status: u16, url: impl Into<String>, body: &str) -> Self {
        AilabError::Status {
            status,
            url: url.into(),
            body: truncate(body, MAX_BODY_IN_ERROR).to_string(),
        }
    }

    /// HTTP status code, if this is a status error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AilabError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AilabError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AilabError::Timeout(err.to_string())
        } else if err.is_connect() {
            AilabError::Request(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            AilabError::Decode(format!("Failed to decode response: {}", err))
        } else {
            AilabError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AilabError {
    fn from(err: serde_json::Error) -> Self {
        AilabError::Decode(format!("JSON parsing error: {}", err))
    }
}

#[cfg(feature = "python")]
impl From<AilabError> for pyo3::PyErr {
    fn from(err: AilabError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyConnectionError, PyRuntimeError, PyValueError};

        let msg = err.to_string();
        match &err {
            AilabError::InvalidArgument(_) => PyValueError::new_err(msg),
            AilabError::Config(_) => PyValueError::new_err(msg),
            AilabError::Request(_) => PyConnectionError::new_err(msg),
            AilabError::Timeout(_) => PyConnectionError::new_err(msg),
            AilabError::Status { .. } => PyRuntimeError::new_err(msg),
            AilabError::Decode(_) => PyRuntimeError::new_err(msg),
            AilabError::Stream(_) => PyRuntimeError::new_err(msg),
            AilabError::Internal(_) => PyRuntimeError::new_err(msg),
        }
    }
}

/// Longest prefix of `s` no longer than `max` bytes that ends on a char boundary
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    let mut end = s.len().min(max);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Result type alias for ailab client operations
pub type Result<T> = std::result::Result<T, AilabError>;
