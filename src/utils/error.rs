use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("HTTP error: {status} - {status_text}")]
    HttpStatusError { status: u16, status_text: String },

    #[error("Malformed response body: {message}")]
    ParseError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Storage error on key '{key}': {message}")]
    StorageError { key: String, message: String },
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ConfigError {
            message: format!("invalid URL: {}", err),
        }
    }
}

impl AppError {
    /// Builds the status variant from a reqwest status code.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        AppError::HttpStatusError {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// Maps a reqwest error onto the transport taxonomy: status errors keep their code,
    /// decode errors become parse errors, everything else is a network error.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            AppError::from_status(status)
        } else if err.is_decode() {
            AppError::ParseError {
                message: err.to_string(),
            }
        } else {
            AppError::NetworkError(err)
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_) | AppError::HttpStatusError { .. } | AppError::ParseError { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::NetworkError(_) => "Could not reach the remote service".to_string(),
            AppError::HttpStatusError { status, status_text } => {
                format!("The remote service answered {} {}", status, status_text)
            }
            AppError::ParseError { .. } => "The remote service sent an unreadable response".to_string(),
            AppError::IoError(e) => format!("File access failed: {}", e),
            AppError::ConfigError { message } => format!("Configuration problem: {}", message),
            AppError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            AppError::StorageError { key, .. } => format!("Could not persist '{}'", key),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::NetworkError(_) => "Check your network connection and try again",
            AppError::HttpStatusError { .. } => "The service may be down; try again later",
            AppError::ParseError { .. } => "Verify the endpoint URL points at the expected API",
            AppError::IoError(_) | AppError::StorageError { .. } => {
                "Check that the storage path is writable"
            }
            AppError::ConfigError { .. } | AppError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line flags"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
