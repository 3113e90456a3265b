//! Domain-level errors (no I/O concerns)

use thiserror::Error;

/// Domain errors represent violations of the sampling/walking contract.
/// These are independent of how a tree was loaded or where output goes.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("unrecognized sampling method `{0}`; possible options are \"simple\" and \"complex\"")]
    InvalidMethod(String),

    #[error("malformed treatment tree: {reason}")]
    MalformedTree { reason: String },

    #[error("treatment tree exceeded the maximum reduction depth ({depth} levels)")]
    UnboundedRecursion { depth: usize },
}

impl DomainError {
    /// Shorthand for a `MalformedTree` with a formatted reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedTree {
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
