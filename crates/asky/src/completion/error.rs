//! Completion client error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for completion operations.
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Errors that can occur while requesting a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("completion endpoint returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    /// The response carried no usable reply text.
    #[error("completion response carried no reply text")]
    EmptyReply,
}
