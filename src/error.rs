//! Error types shared by the validators, normalizers and query tasks.

use thiserror::Error;

/// Reasons a postal code or an upstream record failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid postal code {code:?}: {reason}")]
    PostalCode { code: String, reason: &'static str },

    #[error("Unknown state code: {0:?}")]
    UnknownStateCode(String),

    #[error("Unknown state name: {0:?}")]
    UnknownStateName(String),

    #[error("Unknown region: {0:?}")]
    UnknownRegion(String),

    #[error("Unknown upstream provider: {0:?}")]
    UnknownProvider(String),

    #[error("Required field is empty: {0}")]
    MissingField(&'static str),

    #[error("State code {code:?} does not match state name {name:?}")]
    StateMismatch { code: String, name: String },

    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::Decode(err.to_string())
    }
}

/// Failure modes of a single service query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Bad request: postal code must have 8 digits")]
    BadRequest,

    #[error("Postal code not found")]
    NotFound,

    #[error("Upstream timed out")]
    Timeout,

    #[error("Upstream internal server error")]
    Upstream,

    #[error("Upstream service unavailable")]
    Unavailable,

    #[error("Invalid upstream response: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unexpected HTTP status {0}")]
    Unknown(u16),
}

impl QueryError {
    /// Classify a non-200 HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => QueryError::BadRequest,
            404 => QueryError::NotFound,
            408 => QueryError::Timeout,
            500 => QueryError::Upstream,
            503 => QueryError::Unavailable,
            other => QueryError::Unknown(other),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::MalformedInput(_) => "malformed_input",
            QueryError::Transport(_) => "transport_error",
            QueryError::BadRequest => "bad_request",
            QueryError::NotFound => "not_found",
            QueryError::Timeout => "timeout",
            QueryError::Upstream => "upstream_error",
            QueryError::Unavailable => "unavailable",
            QueryError::Validation(_) => "validation_error",
            QueryError::Unknown(_) => "unknown",
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        QueryError::Transport(err.to_string())
    }
}
