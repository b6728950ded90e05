//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// The variants form the full taxonomy surfaced by user-facing operations. The
/// boundary (HTTP, CLI, ...) maps each one onto its own status vocabulary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (bad filter field, inverted range, empty name, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The actor is not allowed to perform the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request clashes with current state: a duplicate key, or not enough
    /// inventory to cover a listing. Retrying without a change fails again.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An optimistic check lost a race with a concurrent writer.
    #[error("concurrent modification: {0}")]
    Concurrency(String),

    /// The entity is in a lifecycle state that does not allow the action.
    #[error("invalid state: {0}")]
    State(String),

    /// The backing store could not serve the request (e.g. a poisoned lock).
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn concurrency(msg: impl Into<String>) -> Self {
        Self::Concurrency(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable machine-readable code, used in logs and by boundary adapters.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound(_) => "not_found",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::Conflict(_) => "conflict",
            DomainError::Concurrency(_) => "concurrent_modification",
            DomainError::State(_) => "state_error",
            DomainError::Storage(_) => "storage_error",
        }
    }

    /// Whether retrying the same operation against fresh state may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Concurrency(_))
    }
}
