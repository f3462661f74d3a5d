//! Storage error types.

use thiserror::Error;
use uuid::Uuid;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Group not found.
    #[error("group not found: {group_id}")]
    GroupNotFound { group_id: Uuid },

    /// Organization not found.
    #[error("organization not found: {organization_id}")]
    OrganizationNotFound { organization_id: Uuid },

    /// Cipher not found.
    #[error("cipher not found: {cipher_id}")]
    CipherNotFound { cipher_id: Uuid },

    /// An entity with the same id already exists.
    #[error("duplicate id: {id}")]
    DuplicateId { id: Uuid },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Backend unavailable or write rejected.
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },

    /// Internal error.
    #[error("internal storage error: {message}")]
    InternalError { message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
