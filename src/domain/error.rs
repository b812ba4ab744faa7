//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the page tree contract.
/// They are always fatal to the call that triggered them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("index {index} out of range for container with {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("structural violation: {0}")]
    StructuralViolation(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
