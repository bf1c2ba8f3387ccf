//! DLC provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DlcError {
    /// Error returned in the API response envelope
    #[error("DLC API error {code}: {message} (request id: {request_id})")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid attribute '{name}': {message}")]
    InvalidAttribute { name: String, message: String },

    #[error("Malformed identifier '{id}': expected {expected} '#'-separated parts")]
    MalformedId { id: String, expected: usize },

    #[error("Invalid identifier '{id}': {message}")]
    InvalidIdentifier { id: String, message: String },

    #[error("Timed out waiting for {what} after {attempts} attempts")]
    Timeout { what: String, attempts: u32 },

    #[error("{what} entered unexpected state {state}")]
    UnexpectedState { what: String, state: String },
}

impl DlcError {
    /// Shorthand for an invalid-attribute error
    pub fn invalid_attribute(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            message: message.into(),
        }
    }

    /// API error code, if this is an API error
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// Whether the resource addressed by the request does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { code, .. } => {
                code.starts_with("ResourceNotFound") || code.starts_with("InvalidParameter.NotFound")
            }
            _ => false,
        }
    }

    /// Whether retrying the same request may succeed
    ///
    /// Throttling, transient service failures and transport errors are
    /// retryable; everything else (bad parameters, auth, conflicts) is
    /// surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { code, .. } => {
                code == "InternalError"
                    || code == "RequestLimitExceeded"
                    || code.starts_with("ResourceUnavailable")
                    || code.starts_with("FailedOperation.HttpCallError")
                    || code == "ServiceUnavailable"
            }
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DlcError>;
