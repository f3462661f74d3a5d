//! Domain error types for authorization operations.

use thiserror::Error;

use crate::model::Operation;

/// Domain-specific errors for authorization operations.
///
/// None of these ever reach an external caller as an authorization outcome;
/// the gate converts every failure into a [`crate::Decision`].
#[derive(Debug, Error)]
pub enum DomainError {
    /// An operation has no legacy predicate or no policy handler.
    #[error("no {path} rule registered for operation {operation}")]
    ConfigurationFault {
        operation: Operation,
        path: &'static str,
    },

    /// Error reading resource state needed by a policy handler.
    #[error("resource lookup error: {message}")]
    ResourceLookup { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
