//! Error types for polyclinic

use thiserror::Error;

/// Coarse error classification, used to pick how a notice is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Network errors
    NetworkError,
    ApiRejected,
    Unauthorized,

    // User errors
    Validation,
    NoSelection,
    InvalidConfig,

    // System errors
    FileError,
    SpawnError,
}

/// Normalized failure reported by the backend.
///
/// Every call site consumes this shape regardless of whether the backend
/// answered with an envelope (`success: false`), a bare error body or a
/// plain-text status page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status, when the failure came from a non-2xx response
    pub status: Option<u16>,
    /// Human readable message
    pub message: String,
    /// Backend `errorCode`, if any
    pub code: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            code: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }
}

/// Main error type for polyclinic
#[derive(Error, Debug)]
pub enum PolyclinicError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Session expired. Please log in again.")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("No selection made")]
    NoSelection,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PolyclinicError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Network(_) => ErrorCode::NetworkError,
            Self::Api(_) => ErrorCode::ApiRejected,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::Validation(_) => ErrorCode::Validation,
            Self::NoSelection => ErrorCode::NoSelection,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::File(_) => ErrorCode::FileError,
            Self::Spawn(_) => ErrorCode::SpawnError,
            Self::Http(_) => ErrorCode::NetworkError,
            Self::Json(_) => ErrorCode::ApiRejected,
        }
    }

    /// Whether the failure was caught before any request was sent
    pub fn is_client_side(&self) -> bool {
        matches!(self.code(), ErrorCode::Validation | ErrorCode::NoSelection)
    }
}

pub type Result<T> = std::result::Result<T, PolyclinicError>;
