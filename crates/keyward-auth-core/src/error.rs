//! Auth errors

use keyward_db::DbError;
use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Signature does not verify, or the token declares another algorithm
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token has expired
    #[error("token expired")]
    Expired,

    /// Token is not a well-formed claim set of the expected purpose
    #[error("malformed token claims")]
    MalformedClaims,

    /// Refresh token was superseded by a later refresh or login
    #[error("refresh token superseded")]
    StaleToken,

    /// No session exists for (principal, app)
    #[error("session not found")]
    SessionNotFound,

    /// Signing key unusable
    #[error("token signing failed: {0}")]
    Signing(String),

    /// Backing store failed; retryable by the caller
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Invalid credentials (unknown email or wrong password)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email already registered
    #[error("principal already exists")]
    PrincipalExists,

    /// Referenced app (or principal) does not exist
    #[error("unknown app")]
    UnknownApp,

    /// Token handoff missing, already collected, or expired
    #[error("token handoff not found")]
    HandoffNotFound,

    /// Request input rejected before touching any state
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// True for every failure that means "the presented token is not good".
    ///
    /// These must be indistinguishable to clients.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidSignature
                | Self::Expired
                | Self::MalformedClaims
                | Self::StaleToken
                | Self::SessionNotFound
        )
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidSignature
            | Self::Expired
            | Self::MalformedClaims
            | Self::StaleToken
            | Self::SessionNotFound
            | Self::InvalidCredentials => 401,
            Self::PrincipalExists => 409,
            Self::HandoffNotFound => 404,
            Self::UnknownApp | Self::InvalidInput(_) => 400,
            Self::StorageUnavailable(_) => 503,
            Self::Signing(_) | Self::Configuration(_) => 500,
        }
    }

    /// Get the precise error code, for logs only
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Expired => "TOKEN_EXPIRED",
            Self::MalformedClaims => "MALFORMED_CLAIMS",
            Self::StaleToken => "STALE_TOKEN",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::Signing(_) => "SIGNING_ERROR",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::PrincipalExists => "PRINCIPAL_EXISTS",
            Self::UnknownApp => "UNKNOWN_APP",
            Self::HandoffNotFound => "HANDOFF_NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Get error code for API responses; token failures collapse to one code
    pub fn public_code(&self) -> &'static str {
        if self.is_unauthenticated() {
            "UNAUTHORIZED"
        } else {
            self.error_code()
        }
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Self::SessionNotFound,
            DbError::Conflict(msg) => {
                tracing::debug!("Unique constraint violated: {}", msg);
                Self::PrincipalExists
            }
            DbError::ForeignKey(msg) => {
                tracing::debug!("Foreign key violated: {}", msg);
                Self::UnknownApp
            }
            other => {
                tracing::error!("Database error: {}", other);
                Self::StorageUnavailable(other.to_string())
            }
        }
    }
}
