//! Storage error types.

/// Errors produced by record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A unique constraint was violated.
    #[error("duplicate value for unique field '{field}'")]
    Duplicate {
        /// The conflicting field, `username` or `email`.
        field: String,
    },

    /// The referenced record does not exist.
    #[error("record not found")]
    NotFound,

    /// The backend is unreachable or failed.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Description of the backend fault.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `Duplicate` error.
    #[must_use]
    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::Duplicate {
            field: field.into(),
        }
    }

    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a uniqueness violation.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
