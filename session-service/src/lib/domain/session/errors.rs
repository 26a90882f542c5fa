use auth::JwtError;
use auth::PasswordError;
use thiserror::Error;

use crate::user::errors::UserError;
use crate::user::errors::UsernameError;

/// Error for refresh token persistence operations
#[derive(Debug, Clone, Error)]
pub enum RefreshTokenError {
    #[error("Refresh token already exists")]
    AlreadyExists,

    #[error("Refresh token expiry is out of range")]
    ExpiryOutOfRange,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Top-level error for all session operations.
///
/// Domain outcomes (credentials, token state) are kept apart from store
/// failures so callers can tell "access denied" from "service unavailable".
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already exists: {0}")]
    UserExists(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token signing failed: {0}")]
    Signing(String),

    // Infrastructure errors
    #[error("Credential store timed out")]
    StoreTimeout,

    #[error("Credential store error: {0}")]
    Store(String),
}

impl SessionError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::StoreTimeout)
    }
}

impl From<UserError> for SessionError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UsernameAlreadyExists(username) => SessionError::UserExists(username),
            UserError::InvalidUsername(e) => SessionError::InvalidUsername(e),
            UserError::InvalidUserId(e) => SessionError::Store(e.to_string()),
            UserError::DatabaseError(msg) => SessionError::Store(msg),
        }
    }
}

impl From<RefreshTokenError> for SessionError {
    fn from(err: RefreshTokenError) -> Self {
        SessionError::Store(err.to_string())
    }
}

impl From<JwtError> for SessionError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => SessionError::TokenExpired,
            JwtError::SignatureInvalid => {
                SessionError::InvalidToken("signature is invalid".to_string())
            }
            JwtError::Malformed(msg) => SessionError::InvalidToken(msg),
            JwtError::EmptySecret | JwtError::EncodingFailed(_) => {
                SessionError::Signing(err.to_string())
            }
        }
    }
}
