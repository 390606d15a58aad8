//! Error types for the SDR CRM client

use thiserror::Error;

/// Main error type for the CRM client crates
#[derive(Error, Debug)]
pub enum Error {
    /// The API answered with a non-2xx status other than 401
    #[error("{message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server supplied `detail`/`message`, or a generic fallback
        message: String,
    },

    /// The API answered 401; the stored token has been cleared
    #[error("Session expired, please log in again")]
    Unauthorized,

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed or unexpected JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (token file, config file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Form validation failed before anything was submitted
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// Resource not found
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Builds the error for a failed HTTP status.
    ///
    /// The message is taken from the body's `detail` field, then `message`,
    /// falling back to `Request failed: <status>`.
    #[must_use]
    pub fn from_status(status: u16, body: Option<&serde_json::Value>) -> Self {
        let message = body
            .and_then(|b| {
                ["detail", "message"]
                    .iter()
                    .find_map(|key| b.get(key).and_then(message_text))
            })
            .unwrap_or_else(|| format!("Request failed: {status}"));

        Self::Api { status, message }
    }

    /// Create a validation error for one field
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }
}

// FastAPI style validation failures put a list under `detail`.
fn message_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        fields
            .into_iter()
            .find_map(|(field, errs)| {
                errs.first().map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string);
                    Self::validation(field.to_string(), message)
                })
            })
            .unwrap_or_else(|| Self::validation("form", "invalid input"))
    }
}
