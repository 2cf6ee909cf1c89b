//! Client errors

use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No session: `login` was never called or the session was cleared
    #[error("Not logged in")]
    NotLoggedIn,

    /// The refresh token was refused; log in again
    #[error("Session expired")]
    SessionExpired,

    /// Credentials refused at login, or a 401 that survived a refresh
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 400 with the server's error code
    #[error("Validation error [{code}]: {message}")]
    Validation { code: String, message: String },

    /// 409 business rule or concurrency conflict
    #[error("Conflict [{code}]: {message}")]
    Conflict { code: String, message: String },

    #[error("Server error: {0}")]
    Server(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Error body returned by the API.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

impl Error {
    /// Map a non-success response to an error, using the API's error body
    /// when it parses.
    pub fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = if parsed.message.is_empty() {
            body.to_string()
        } else {
            parsed.message
        };
        let code = parsed.error;
        match status.as_u16() {
            400 | 422 => Error::Validation { code, message },
            401 => Error::Authentication(message),
            403 => Error::Forbidden(message),
            404 => Error::NotFound(message),
            409 => Error::Conflict { code, message },
            500..=599 => Error::Server(message),
            _ => Error::Other(format!("HTTP {}: {}", status, message)),
        }
    }

    /// Server error code for validation and conflict errors.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Validation { code, .. } | Error::Conflict { code, .. } => Some(code),
            _ => None,
        }
    }
}
