use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::user::errors::UserIdError;
use crate::user::errors::UsernameError;

/// User aggregate entity.
///
/// The password hash is opaque to everything but the password hasher and is
/// redacted from `Debug` output; HTTP DTOs never carry it.
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub password_hash: String,
    pub registered_at: DateTime<Utc>,
    pub avatar: Option<String>,
    pub is_disabled: bool,
    pub is_admin: bool,
}

impl User {
    /// Build a freshly registered user with default flags.
    pub fn new(username: Username, password_hash: String, registered_at: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            username,
            password_hash,
            registered_at,
            avatar: None,
            is_disabled: false,
            is_admin: false,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("registered_at", &self.registered_at)
            .field("avatar", &self.avatar)
            .field("is_disabled", &self.is_disabled)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Only structural constraints live here (non-empty, bounded length). Character
/// rules belong to whichever front end collects the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// Surrounding whitespace is trimmed before validation.
    ///
    /// # Errors
    /// * `Empty` - Nothing left after trimming
    /// * `TooLong` - Longer than 32 characters
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = username.trim();
        let length = username.chars().count();

        if length == 0 {
            Err(UsernameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(username.to_string()))
        }
    }

    /// Get username as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
