//! Authentication error types.
//!
//! This module defines all error types that can occur during token
//! issuance, validation, refresh, and revocation.

use std::fmt;

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The supplied login credentials could not be verified.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No token was presented where one is required.
    #[error("Missing token")]
    MissingToken,

    /// The token string is structurally invalid or carries unusable claims.
    #[error("Malformed token: {message}")]
    Malformed {
        /// Description of why the token is malformed.
        message: String,
    },

    /// The token signature does not verify against any held key.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token has expired (beyond the configured skew tolerance).
    #[error("Token expired")]
    Expired,

    /// The refresh token was already rotated; exactly one caller wins a
    /// rotation and every other presenter of the same token sees this.
    #[error("Refresh token already rotated")]
    AlreadyRotated,

    /// The token has been explicitly revoked.
    #[error("Token revoked")]
    Revoked,

    /// The token id is unknown to the store.
    #[error("Token not found")]
    NotFound,

    /// A store operation failed transiently (timeout, connection loss).
    /// This is the only retryable condition; the core never retries it.
    #[error("Transient store failure: {message}")]
    TransientStoreFailure {
        /// Description of the transient failure.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a new `TransientStoreFailure` error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientStoreFailure {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this failure is definitive for the presented
    /// credential. Definitive failures must not be retried with the same
    /// token; the client's only recourse is re-authentication.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::MissingToken
                | Self::Malformed { .. }
                | Self::InvalidSignature
                | Self::Expired
                | Self::AlreadyRotated
                | Self::Revoked
                | Self::NotFound
        )
    }

    /// Returns `true` if the caller may retry the same operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientStoreFailure { .. })
    }

    /// Returns `true` if this failure indicates detected reuse of a
    /// consumed or revoked refresh token.
    #[must_use]
    pub fn is_reuse(&self) -> bool {
        matches!(self, Self::AlreadyRotated | Self::Revoked)
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCredentials => ErrorCategory::Authentication,
            Self::MissingToken => ErrorCategory::Authentication,
            Self::Malformed { .. } => ErrorCategory::Token,
            Self::InvalidSignature => ErrorCategory::Token,
            Self::Expired => ErrorCategory::Token,
            Self::AlreadyRotated => ErrorCategory::Rotation,
            Self::Revoked => ErrorCategory::Rotation,
            Self::NotFound => ErrorCategory::Rotation,
            Self::TransientStoreFailure { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    ///
    /// Used by the boundary layer when rendering transport responses.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_grant",
            Self::MissingToken => "invalid_request",
            Self::Malformed { .. } => "invalid_token",
            Self::InvalidSignature => "invalid_token",
            Self::Expired => "invalid_token",
            Self::AlreadyRotated => "invalid_grant",
            Self::Revoked => "invalid_token",
            Self::NotFound => "invalid_grant",
            Self::TransientStoreFailure { .. } => "temporarily_unavailable",
            Self::Configuration { .. } => "server_error",
            Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of authentication errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential verification failures.
    Authentication,
    /// Token decoding and validation failures.
    Token,
    /// Refresh rotation and revocation failures.
    Rotation,
    /// Store/infrastructure failures.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Token => write!(f, "token"),
            Self::Rotation => write!(f, "rotation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
