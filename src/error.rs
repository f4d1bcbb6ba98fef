//! Error types and handling for `railcast`

use thiserror::Error;

/// Main error type for the `railcast` library
#[derive(Error, Debug)]
pub enum RailcastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Unexpected HTTP status from a remote server
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The remote resource does not exist (HTTP 404)
    #[error("HTTP 404: {url} not found")]
    NotFound { url: String },

    /// Every download attempt failed
    #[error("Failed to download {url} after {attempts} attempts{detail}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        detail: String,
    },

    /// CSV reading or writing errors
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("{message}")]
    General { message: String },
}

impl RailcastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            RailcastError::Http { status, .. } => Some(*status),
            RailcastError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            RailcastError::Config { .. } => {
                "Configuration error. Please check your config file and credentials.".to_string()
            }
            RailcastError::Api { message } => {
                format!("Remote service rejected the request: {message}")
            }
            RailcastError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            RailcastError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            RailcastError::Http { .. }
            | RailcastError::NotFound { .. }
            | RailcastError::RetriesExhausted { .. } => self.to_string(),
            RailcastError::Csv { source } => format!("Malformed CSV data: {source}"),
            RailcastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            RailcastError::General { message } => message.clone(),
        }
    }
}

impl From<reqwest_middleware::Error> for RailcastError {
    fn from(err: reqwest_middleware::Error) -> Self {
        RailcastError::api(format!("request failed: {err}"))
    }
}

impl From<reqwest::Error> for RailcastError {
    fn from(err: reqwest::Error) -> Self {
        RailcastError::api(format!("request failed: {err}"))
    }
}
