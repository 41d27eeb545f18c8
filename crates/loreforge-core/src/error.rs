//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Error returned by collaborators (persistence, reasoning, rosters).
#[derive(Debug, Error)]
pub enum DomainError {
    /// A requested record was not found.
    #[error("not found: {0}")]
    NotFound(Uuid),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// The reasoning service failed or could not be reached.
    #[error("reasoning error: {0}")]
    Reasoning(String),

    /// The operation observed a cancellation request.
    #[error("operation cancelled")]
    Cancelled,
}
