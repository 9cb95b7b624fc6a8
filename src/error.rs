//! Error types for taskboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config, fetch already in flight)
//! - 3: Upstream unavailable (HTTP failure, timeout, malformed response)
//! - 4: Operation failed (IO, serialization, malformed record)

use thiserror::Error;

/// Exit codes for the taskboard CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const UPSTREAM_FAILED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("A page fetch is already in flight")]
    FetchInFlight,

    #[error("No more pages available upstream")]
    NoMorePages,

    // Upstream failures (exit code 3), all retryable
    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Upstream response rejected: {0}")]
    UpstreamResponse(String),

    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Pages before the failure were loaded and already reported
    #[error("Load stopped after {pages} page(s): {source}")]
    PartialLoad { pages: usize, source: Box<Error> },

    // Operation failures (exit code 4)
    #[error("Malformed record: {reason}")]
    MalformedRecord { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::PartialLoad { source, .. } => source.exit_code(),

            // User errors
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::FetchInFlight
            | Error::NoMorePages => exit_codes::USER_ERROR,

            // Upstream failures
            Error::UpstreamStatus { .. } | Error::UpstreamResponse(_) | Error::Http(_) => {
                exit_codes::UPSTREAM_FAILED
            }

            // Operation failures
            Error::MalformedRecord { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Upstream failures leave local state intact and can be retried from
    /// the same cursor.
    pub fn is_retryable(&self) -> bool {
        self.exit_code() == exit_codes::UPSTREAM_FAILED
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            reason: reason.into(),
        }
    }

    /// Structured context for the JSON error envelope
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::PartialLoad { pages, source } => {
                let mut details = source
                    .details()
                    .unwrap_or_else(|| serde_json::json!({}));
                details["pages_loaded"] = serde_json::json!(pages);
                Some(details)
            }
            Error::UpstreamStatus { status, .. } => {
                Some(serde_json::json!({ "status": status, "retryable": true }))
            }
            Error::UpstreamResponse(_) | Error::Http(_) => {
                Some(serde_json::json!({ "retryable": true }))
            }
            _ => None,
        }
    }
}

/// Result type alias for taskboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
