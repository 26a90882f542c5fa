use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by an access token.
///
/// Only the registered claims the session service relies on are modelled.
/// Access tokens are never persisted, so these three fields are the whole
/// state of a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
}

impl AccessClaims {
    /// Build claims for `subject` issued at `now` and valid for `ttl`.
    pub fn new(subject: impl ToString, now: DateTime<Utc>, ttl: Duration) -> Self {
        let issued_at = now.timestamp();
        Self {
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at + ttl.num_seconds(),
        }
    }

    /// Check if the token is expired at `current_timestamp`.
    ///
    /// A token is no longer valid from the second its `exp` is reached.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }
}
