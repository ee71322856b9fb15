//! Error types for Earth Engine requests.

use thiserror::Error;

/// Errors produced while composing or executing Earth Engine requests.
#[derive(Error, Debug)]
pub enum GeeError {
    #[cfg(feature = "api")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Earth Engine returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid month {0} (expected 1..=12)")]
    InvalidMonth(u32),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl GeeError {
    /// True for failures of the remote service itself, as opposed to
    /// malformed input.
    pub fn is_service_failure(&self) -> bool {
        match self {
            #[cfg(feature = "api")]
            GeeError::Http(_) => true,
            GeeError::Service { .. } | GeeError::Decode(_) => true,
            GeeError::InvalidMonth(_)
            | GeeError::InvalidRequest(_)
            | GeeError::InvalidGeometry(_) => false,
        }
    }
}

/// Result alias for Earth Engine operations.
pub type Result<T> = std::result::Result<T, GeeError>;
