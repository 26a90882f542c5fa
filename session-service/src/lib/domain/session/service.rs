use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use auth::AccessTokenCodec;
use auth::PasswordHasher;

use crate::domain::session::clock::Clock;
use crate::domain::session::clock::SystemClock;
use crate::domain::session::errors::SessionError;
use crate::domain::session::models::RefreshTokenState;
use crate::domain::session::models::SessionClaims;
use crate::domain::session::models::SessionConfig;
use crate::domain::session::models::TokenPair;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::session::refresh_tokens::RefreshTokenStore;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;

/// Token lifecycle manager.
///
/// Stateless between calls: users and refresh tokens live in the injected
/// repositories, so one instance can serve concurrent requests for any number
/// of users. Access tokens are verified by signature and expiry alone; refresh
/// tokens are store-backed so they can be revoked early.
pub struct SessionService<UR, TR>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
{
    users: Arc<UR>,
    refresh_tokens: RefreshTokenStore<TR>,
    codec: AccessTokenCodec,
    password_hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl<UR, TR> SessionService<UR, TR>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
{
    /// Create a new session service with injected dependencies.
    ///
    /// # Arguments
    /// * `config` - Signing secret, token lifetimes and store timeout
    /// * `users` - User persistence implementation
    /// * `refresh_tokens` - Refresh token persistence implementation
    ///
    /// # Errors
    /// * `Signing` - The signing secret is empty
    pub fn new(
        config: SessionConfig,
        users: Arc<UR>,
        refresh_tokens: Arc<TR>,
    ) -> Result<Self, SessionError> {
        let codec = AccessTokenCodec::new(&config.signing_secret, config.access_token_ttl)?;

        Ok(Self {
            users,
            refresh_tokens: RefreshTokenStore::new(refresh_tokens),
            codec,
            password_hasher: PasswordHasher::new(),
            clock: Arc::new(SystemClock),
            config,
        })
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run a store call under the configured timeout.
    async fn bounded<T, E, F>(&self, call: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, E>>,
        SessionError: From<E>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => result.map_err(SessionError::from),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.store_timeout.as_millis() as u64,
                    "Credential store call timed out"
                );
                Err(SessionError::StoreTimeout)
            }
        }
    }
}

#[async_trait]
impl<UR, TR> SessionServicePort for SessionService<UR, TR>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
{
    async fn register(&self, username: &str, password: &str) -> Result<User, SessionError> {
        let username = Username::new(username.to_string())?;
        if password.is_empty() {
            return Err(SessionError::InvalidPassword(
                "password must not be empty".to_string(),
            ));
        }

        // Fast path only; the store's unique constraint decides races.
        if self.bounded(self.users.exists_by_username(&username)).await? {
            return Err(SessionError::UserExists(username.to_string()));
        }

        let password_hash = self.password_hasher.hash(password)?;
        let user = User::new(username, password_hash, self.clock.now());

        let created_user = self.bounded(self.users.create(user)).await?;
        tracing::info!(user_id = %created_user.id, username = %created_user.username, "User registered");

        Ok(created_user)
    }

    async fn login(&self, username: &str, password: &str) -> Result<User, SessionError> {
        let Ok(username) = Username::new(username.to_string()) else {
            self.password_hasher.verify_decoy(password);
            return Err(SessionError::InvalidCredentials);
        };

        let Some(user) = self.bounded(self.users.find_by_username(&username)).await? else {
            self.password_hasher.verify_decoy(password);
            return Err(SessionError::InvalidCredentials);
        };

        if !self.password_hasher.verify(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(SessionError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    async fn issue_token_pair(&self, user_id: &UserId) -> Result<TokenPair, SessionError> {
        let now = self.clock.now();
        let (access_token, _) = self.codec.issue(&user_id.to_string(), now)?;

        let record = self
            .bounded(
                self.refresh_tokens
                    .issue(*user_id, now, self.config.refresh_token_ttl),
            )
            .await?;

        tracing::debug!(user_id = %user_id, expires_at = %record.expires_at, "Token pair issued");

        Ok(TokenPair {
            access_token,
            refresh_token: record.token,
            expires_in: self.codec.ttl().num_seconds(),
        })
    }

    async fn rotate_token_pair(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let now = self.clock.now();

        let record = self
            .bounded(self.refresh_tokens.lookup(refresh_token))
            .await?
            .ok_or_else(|| SessionError::InvalidToken("unknown refresh token".to_string()))?;

        match record.state(now) {
            RefreshTokenState::Active => {}
            RefreshTokenState::Revoked => {
                tracing::warn!(user_id = %record.user_id, "Revoked refresh token presented");
                return Err(SessionError::TokenRevoked);
            }
            RefreshTokenState::Expired => return Err(SessionError::TokenExpired),
        }

        // Revoke before issuing: if issuance fails the caller must log in
        // again, and the old token stays dead.
        if !self.bounded(self.refresh_tokens.claim(refresh_token)).await? {
            tracing::warn!(user_id = %record.user_id, "Concurrent rotation of refresh token lost");
            return Err(SessionError::TokenRevoked);
        }

        self.issue_token_pair(&record.user_id).await
    }

    async fn revoke_refresh_token(&self, refresh_token: &str) {
        if let Err(e) = self.bounded(self.refresh_tokens.revoke(refresh_token)).await {
            tracing::warn!(error = %e, "Failed to revoke refresh token");
        }
    }

    async fn revoke_all_sessions(&self, user_id: &UserId) -> Result<u64, SessionError> {
        let revoked = self
            .bounded(self.refresh_tokens.revoke_all_for_owner(user_id))
            .await?;
        tracing::info!(user_id = %user_id, revoked, "All refresh tokens revoked");
        Ok(revoked)
    }

    fn validate_access_token(&self, access_token: &str) -> Result<SessionClaims, SessionError> {
        let claims = self.codec.verify(access_token, self.clock.now())?;
        SessionClaims::try_from(claims)
    }

    async fn get_user(&self, user_id: &UserId) -> Result<User, SessionError> {
        self.bounded(self.users.find_by_id(user_id))
            .await?
            .ok_or(SessionError::UserNotFound(user_id.to_string()))
    }

    async fn purge_expired_tokens(&self) -> Result<u64, SessionError> {
        let deleted = self
            .bounded(self.refresh_tokens.delete_expired(self.clock.now()))
            .await?;
        tracing::debug!(deleted, "Expired refresh tokens purged");
        Ok(deleted)
    }
}
