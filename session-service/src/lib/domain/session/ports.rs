use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::session::errors::RefreshTokenError;
use crate::domain::session::errors::SessionError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::SessionClaims;
use crate::domain::session::models::TokenPair;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Port for the token lifecycle operations exposed to callers.
#[async_trait]
pub trait SessionServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `UserExists` - Username is already taken, including when a concurrent
    ///   registration wins the insert
    /// * `InvalidUsername` / `InvalidPassword` - Input rejected before storage
    /// * `Store` / `StoreTimeout` - Credential store unavailable
    async fn register(&self, username: &str, password: &str) -> Result<User, SessionError>;

    /// Check a username/password pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown user or wrong password, indistinguishably
    /// * `Store` / `StoreTimeout` - Credential store unavailable
    async fn login(&self, username: &str, password: &str) -> Result<User, SessionError>;

    /// Issue a fresh access/refresh pair for a user. The only way a refresh
    /// token comes into existence.
    ///
    /// # Errors
    /// * `Signing` - Access token could not be signed
    /// * `Store` / `StoreTimeout` - Refresh token could not be persisted
    async fn issue_token_pair(&self, user_id: &UserId) -> Result<TokenPair, SessionError>;

    /// Exchange a refresh token for a new pair, consuming the presented one.
    ///
    /// # Errors
    /// * `InvalidToken` - Token unknown
    /// * `TokenRevoked` - Token already rotated or logged out
    /// * `TokenExpired` - Token past its expiry
    /// * `Store` / `StoreTimeout` - Credential store unavailable
    async fn rotate_token_pair(&self, refresh_token: &str) -> Result<TokenPair, SessionError>;

    /// Revoke a refresh token (logout). Never fails visibly.
    async fn revoke_refresh_token(&self, refresh_token: &str);

    /// Revoke every refresh token a user holds ("log out everywhere").
    ///
    /// # Returns
    /// Number of tokens that were still unrevoked
    async fn revoke_all_sessions(&self, user_id: &UserId) -> Result<u64, SessionError>;

    /// Verify an access token. Signature and expiry only, no store access.
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed, tampered, or signed with another key/algorithm
    /// * `TokenExpired` - Token past its expiry
    fn validate_access_token(&self, access_token: &str) -> Result<SessionClaims, SessionError>;

    /// Retrieve a user by identifier.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    async fn get_user(&self, user_id: &UserId) -> Result<User, SessionError>;

    /// Delete refresh tokens whose expiry has passed.
    ///
    /// # Returns
    /// Number of deleted records
    async fn purge_expired_tokens(&self) -> Result<u64, SessionError>;
}

/// Persistence operations for refresh tokens.
///
/// Lookups are pure reads: no implicit filtering on expiry happens here, the
/// caller compares `expires_at` against its own clock.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    /// Persist a new refresh token.
    ///
    /// # Errors
    /// * `AlreadyExists` - Token value collides with an existing record
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, token: &RefreshToken) -> Result<(), RefreshTokenError>;

    /// Retrieve a token record in any state.
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, RefreshTokenError>;

    /// Retrieve a token record only if it has not been revoked.
    async fn find_active_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, RefreshTokenError>;

    /// Atomically flip `revoked` from false to true.
    ///
    /// # Returns
    /// True only for the single call that performed the flip; concurrent
    /// callers racing on the same token all but one get false.
    async fn revoke_if_active(&self, token: &str) -> Result<bool, RefreshTokenError>;

    /// Mark a token revoked. Idempotent; unknown tokens are not an error.
    async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError>;

    /// Revoke every token owned by a user.
    ///
    /// # Returns
    /// Number of records that changed
    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, RefreshTokenError>;

    /// Delete records with `expires_at` before `now`.
    ///
    /// # Returns
    /// Number of deleted records
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RefreshTokenError>;
}
