//! Error types for the BlueSky admin services.

use thiserror::Error;

/// Result type alias using AdminError.
pub type AdminResult<T> = Result<T, AdminError>;

/// Primary error type for artifact access.
#[derive(Debug, Error)]
pub enum AdminError {
    // === Validation Errors ===
    #[error("Specify '{0}'")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Object Store Errors ===
    #[error("{key} does not exist")]
    NotFound { key: String },

    /// Any store failure other than a missing key. `message` carries the
    /// store's own description and is only logged.
    #[error("Failure to load {key}")]
    FetchFailed { key: String, message: String },

    #[error("Failure to get request list: {0}")]
    ListFailed(String),

    #[error("Invalid document {key}: {message}")]
    InvalidDocument { key: String, message: String },

    // === Output Archive Errors ===
    #[error("Failed to fetch output file {key}")]
    ExtractionFailed { key: String, message: String },

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AdminError {
    /// Shorthand for an invalid parameter.
    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        AdminError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// True when the error stems from bad caller input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AdminError::MissingParameter(_) | AdminError::InvalidParameter { .. }
        )
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AdminError::MissingParameter(_) | AdminError::InvalidParameter { .. } => 400,

            AdminError::NotFound { .. } => 404,

            _ => 500,
        }
    }
}

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        AdminError::Internal(err.to_string())
    }
}
