//! Error types for the query cache.

use serde::{Deserialize, Serialize};

/// Transportable description of a failed fetch.
///
/// `code` follows HTTP status conventions where one applies; transport
/// failures without a status use `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Failure code (HTTP status, or 0 for transport-level failures).
    pub code: u16,
    /// Human-readable message.
    pub message: String,
}

impl ErrorInfo {
    /// Create a new error info.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Query cache errors.
///
/// Only `InvalidParameter` crosses the public boundary synchronously;
/// fetch failures become `QueryStatus::Error` state, out-of-order pages
/// are dropped and logged, and hydration mismatches skip the entry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    /// A query parameter could not be serialized (programmer error).
    #[error("parameter `{name}` is not serializable: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A page arrived whose cursor does not match the expected one.
    #[error("out-of-order page append: expected token {expected:?}, got {got:?}")]
    OutOfOrderAppend {
        expected: Option<String>,
        got: Option<String>,
    },

    /// A fetch failed; recoverable by retrying the same operation.
    #[error("fetch failed: {0}")]
    Fetch(ErrorInfo),

    /// A hydration entry references a key that does not canonicalize.
    #[error("hydration entry mismatch for `{key}`: {reason}")]
    HydrationMismatch { key: String, reason: String },
}
