//! Error types for chama-api

use thiserror::Error;

/// Failure of a backend call, as seen by the action that issued it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 from the backend; the session hooks have already run.
    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status, e.g. a validation failure.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// No response was received.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Client setup failed: {0}")]
    Setup(String),

    #[error("Session storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ApiError {
    /// Status code, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Server { status, .. } | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias using ApiError.
pub type Result<T> = std::result::Result<T, ApiError>;
