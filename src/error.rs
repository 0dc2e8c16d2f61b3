//! Error types for `linkcheck-core`.
//!
//! The queue distinguishes expected, recoverable conditions (a timed-out
//! `get` or `join`) from contract violations in the caller, which are
//! surfaced as [`LinkcheckError::InvalidState`] and must be treated as
//! fatal rather than retried.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkcheckError {
    /// A timed-out `get` found no item available. Recoverable: the caller
    /// should retry or exit its worker loop.
    #[error("queue is empty")]
    Empty,

    /// A timed-out `join` found unfinished tasks remaining. Recoverable.
    #[error("timed out waiting for all tasks to finish")]
    Timeout,

    /// Task accounting became inconsistent. A programming-contract defect
    /// in the caller, not a runtime condition to retry.
    #[error("invalid queue state: {0}")]
    InvalidState(String),

    /// Invalid configuration supplied at construction time.
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

pub type Result<T> = std::result::Result<T, LinkcheckError>;
