use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::domain::session::errors::RefreshTokenError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::user::models::UserId;

/// Refresh token store adapter.
///
/// Owns token generation and speaks to the repository in lifecycle terms.
/// `find_usable` filters on the revoked flag only; expiry is checked by the
/// session service against its clock.
pub struct RefreshTokenStore<TR>
where
    TR: RefreshTokenRepository,
{
    repository: Arc<TR>,
}

impl<TR> RefreshTokenStore<TR>
where
    TR: RefreshTokenRepository,
{
    pub fn new(repository: Arc<TR>) -> Self {
        Self { repository }
    }

    /// Produce a new opaque token value (256 bits from the OS CSPRNG).
    pub fn generate() -> String {
        auth::generate_refresh_token()
    }

    /// Generate, persist and return a token for `owner`.
    pub async fn issue(
        &self,
        owner: UserId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<RefreshToken, RefreshTokenError> {
        let record = RefreshToken::new(owner, Self::generate(), now, ttl)?;
        self.repository.create(&record).await?;
        Ok(record)
    }

    /// Persist an already generated token value.
    pub async fn create(
        &self,
        owner: UserId,
        token: String,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<RefreshToken, RefreshTokenError> {
        let record = RefreshToken {
            user_id: owner,
            token,
            expires_at,
            created_at: now,
            revoked: false,
        };
        self.repository.create(&record).await?;
        Ok(record)
    }

    /// Record for `token` in whatever state it is in.
    pub async fn lookup(&self, token: &str) -> Result<Option<RefreshToken>, RefreshTokenError> {
        self.repository.find_by_token(token).await
    }

    /// Record for `token` if it has not been revoked.
    pub async fn find_usable(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, RefreshTokenError> {
        self.repository.find_active_by_token(token).await
    }

    /// Consume `token` for rotation. True only for the caller that won.
    pub async fn claim(&self, token: &str) -> Result<bool, RefreshTokenError> {
        self.repository.revoke_if_active(token).await
    }

    pub async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        self.repository.revoke(token).await
    }

    pub async fn revoke_all_for_owner(&self, owner: &UserId) -> Result<u64, RefreshTokenError> {
        self.repository.revoke_all_for_user(owner).await
    }

    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RefreshTokenError> {
        self.repository.delete_expired(now).await
    }
}
