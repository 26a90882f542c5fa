use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Serialize;

use crate::domain::session::errors::RefreshTokenError;
use crate::domain::session::errors::SessionError;
use crate::domain::user::models::UserId;

/// Default access token lifetime (1 hour)
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Default refresh token lifetime (168 hours)
pub const DEFAULT_REFRESH_TOKEN_TTL_HOURS: i64 = 168;

/// Default bound on a single credential store call
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Longest lifetime accepted for either token kind (100 years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 100 * 365 * 24;

/// Persisted refresh token record.
///
/// `revoked` only ever goes from false to true. A record is usable while it is
/// not revoked and `now < expires_at`; expiry is derived from the timestamp at
/// check time, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}

/// Lifecycle state of a refresh token at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    /// Rotated away or logged out; the store does not distinguish the two.
    Revoked,
    Expired,
}

impl RefreshToken {
    /// Build an unrevoked record created at `now` and living for `ttl`.
    ///
    /// # Errors
    /// * `ExpiryOutOfRange` - `now + ttl` is not a representable timestamp
    pub fn new(
        user_id: UserId,
        token: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, RefreshTokenError> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(RefreshTokenError::ExpiryOutOfRange)?;

        Ok(Self {
            user_id,
            token,
            expires_at,
            created_at: now,
            revoked: false,
        })
    }

    /// State at `now`. Revocation is reported ahead of expiry.
    pub fn state(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked {
            RefreshTokenState::Revoked
        } else if now >= self.expires_at {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == RefreshTokenState::Active
    }
}

/// Access/refresh token pair handed back to the caller. Never stored as such.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Identity resolved from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<auth::AccessClaims> for SessionClaims {
    type Error = SessionError;

    fn try_from(claims: auth::AccessClaims) -> Result<Self, Self::Error> {
        let user_id = UserId::from_string(&claims.sub)
            .map_err(|e| SessionError::InvalidToken(format!("invalid subject: {}", e)))?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0)
            .ok_or_else(|| SessionError::InvalidToken("invalid iat".to_string()))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| SessionError::InvalidToken("invalid exp".to_string()))?;

        Ok(Self {
            user_id,
            issued_at,
            expires_at,
        })
    }
}

/// Construction-time settings of the session service.
#[derive(Clone)]
pub struct SessionConfig {
    /// HMAC signing secret for access tokens
    pub signing_secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Upper bound on every credential store call
    pub store_timeout: std::time::Duration,
}

impl SessionConfig {
    /// Settings with default lifetimes and timeout.
    pub fn new(signing_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl: Duration::hours(DEFAULT_REFRESH_TOKEN_TTL_HOURS),
            store_timeout: std::time::Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        }
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    pub fn with_store_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("signing_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(timestamp: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(timestamp, 0).unwrap()
    }

    #[test]
    fn test_refresh_token_state() {
        let token =
            RefreshToken::new(UserId::new(), "t".to_string(), at(0), Duration::seconds(10))
                .unwrap();

        assert_eq!(token.state(at(9)), RefreshTokenState::Active);
        assert!(token.is_usable(at(9)));
        assert_eq!(token.state(at(10)), RefreshTokenState::Expired);
        assert!(!token.is_usable(at(10)));
    }

    #[test]
    fn test_revoked_reported_before_expired() {
        let mut token =
            RefreshToken::new(UserId::new(), "t".to_string(), at(0), Duration::seconds(10))
                .unwrap();
        token.revoked = true;

        assert_eq!(token.state(at(5)), RefreshTokenState::Revoked);
        assert_eq!(token.state(at(50)), RefreshTokenState::Revoked);
    }

    #[test]
    fn test_refresh_token_expiry_overflow_is_an_error() {
        let result = RefreshToken::new(
            UserId::new(),
            "t".to_string(),
            Utc::now(),
            Duration::days(365 * 1_000_000),
        );

        assert!(matches!(result, Err(RefreshTokenError::ExpiryOutOfRange)));
    }

    #[test]
    fn test_refresh_token_accepts_longest_configurable_ttl() {
        let token = RefreshToken::new(
            UserId::new(),
            "t".to_string(),
            Utc::now(),
            Duration::hours(MAX_TOKEN_TTL_HOURS),
        )
        .unwrap();

        assert!(token.expires_at > token.created_at);
        assert!(token.is_usable(token.created_at));
    }

    #[test]
    fn test_session_claims_from_access_claims() {
        let user_id = UserId::new();
        let claims = auth::AccessClaims {
            sub: user_id.to_string(),
            iat: 100,
            exp: 200,
        };

        let session = SessionClaims::try_from(claims).unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.expires_at, at(200));
    }

    #[test]
    fn test_session_claims_rejects_foreign_subject() {
        let claims = auth::AccessClaims {
            sub: "not-a-uuid".to_string(),
            iat: 100,
            exp: 200,
        };

        assert!(matches!(
            SessionClaims::try_from(claims),
            Err(SessionError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::new("hunter2-signing-key");

        assert_eq!(config.access_token_ttl, Duration::hours(1));
        assert_eq!(config.refresh_token_ttl, Duration::hours(168));
        assert_eq!(config.store_timeout, std::time::Duration::from_secs(10));
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
