//! Error taxonomy for the account service.
//!
//! Every operation in the auth core converts capability-layer faults
//! (store, cache, codec) into one of these kinds at its own boundary.
//! Nothing below the HTTP layer is allowed to surface a raw fault.

/// Errors produced by account and session operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A required input field is missing or blank.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the invalid input.
        message: String,
    },

    /// Login failed. Deliberately covers both "unknown username" and
    /// "wrong password" so the two are indistinguishable to the caller.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A domain rule was violated (e.g. updating disallowed fields).
    #[error("Validation error: {message}")]
    ValidationError {
        /// Description of the violated rule.
        message: String,
    },

    /// A unique constraint (username or email) was violated.
    #[error("Duplicate {field}")]
    DuplicateKey {
        /// The conflicting field, `username` or `email`.
        field: String,
    },

    /// The referenced entity does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },

    /// The bearer token is missing, invalid, expired, or revoked.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The token codec failed to mint a credential.
    #[error("Token creation failed: {message}")]
    TokenCreationFailed {
        /// Description of the codec failure.
        message: String,
    },

    /// An unexpected internal fault occurred.
    #[error("Internal server error: {reason}")]
    Internal {
        /// Terse diagnostic; must never contain credentials or
        /// persistence-layer internals.
        reason: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `ValidationError`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Creates a new `DuplicateKey` error.
    #[must_use]
    pub fn duplicate_key(field: impl Into<String>) -> Self {
        Self::DuplicateKey {
            field: field.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `TokenCreationFailed` error.
    #[must_use]
    pub fn token_creation_failed(message: impl Into<String>) -> Self {
        Self::TokenCreationFailed {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Returns the wire error code used in response envelopes.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidCredentials => "invalid_credentials",
            Self::ValidationError { .. } => "validation_error",
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::NotFound { .. } => "not_found_error",
            Self::Unauthorized { .. } => "unauthorized",
            Self::TokenCreationFailed { .. } => "token_creation_failed",
            Self::Internal { .. } => "internal_server_error",
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::TokenCreationFailed { .. } | Self::Internal { .. }
        )
    }

    /// Returns `true` if this is an authentication failure.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_request("username can't be blank");
        assert_eq!(
            err.to_string(),
            "Invalid request: username can't be blank"
        );

        let err = AuthError::InvalidCredentials;
        assert_eq!(err.to_string(), "Invalid username or password");

        let err = AuthError::duplicate_key("email");
        assert_eq!(err.to_string(), "Duplicate email");
    }

    #[test]
    fn test_error_type_codes() {
        assert_eq!(
            AuthError::invalid_request("x").error_type(),
            "invalid_request"
        );
        assert_eq!(
            AuthError::InvalidCredentials.error_type(),
            "invalid_credentials"
        );
        assert_eq!(AuthError::validation("x").error_type(), "validation_error");
        assert_eq!(
            AuthError::duplicate_key("username").error_type(),
            "duplicate_key"
        );
        assert_eq!(AuthError::not_found("x").error_type(), "not_found_error");
        assert_eq!(AuthError::unauthorized("x").error_type(), "unauthorized");
        assert_eq!(
            AuthError::token_creation_failed("x").error_type(),
            "token_creation_failed"
        );
        assert_eq!(
            AuthError::internal("x").error_type(),
            "internal_server_error"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(AuthError::InvalidCredentials.is_client_error());
        assert!(AuthError::InvalidCredentials.is_authentication_error());
        assert!(AuthError::unauthorized("x").is_authentication_error());
        assert!(!AuthError::not_found("x").is_authentication_error());

        assert!(AuthError::internal("db down").is_server_error());
        assert!(AuthError::token_creation_failed("sign").is_server_error());
        assert!(!AuthError::validation("x").is_server_error());
    }
}
