use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::session::errors::RefreshTokenError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::domain::visitor::errors::VisitorError;
use crate::domain::visitor::models::Visit;
use crate::domain::visitor::ports::VisitorRecorder;
use crate::user::errors::UserError;

#[derive(Default)]
struct CredentialState {
    users: HashMap<UserId, User>,
    usernames: HashMap<String, UserId>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

/// Process-local credential store.
///
/// Users and refresh tokens share one lock, so every operation is atomic with
/// respect to the others, matching the guarantees the Postgres schema gives
/// through its unique constraints and conditional updates.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    state: Mutex<CredentialState>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryCredentialStore {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut state = self.state.lock().await;

        let key = user.username.as_str().to_string();
        if state.usernames.contains_key(&key) {
            return Err(UserError::UsernameAlreadyExists(key));
        }

        state.usernames.insert(key, user.id);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.state.lock().await.users.get(id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        let state = self.state.lock().await;
        Ok(state
            .usernames
            .get(username.as_str())
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn exists_by_username(&self, username: &Username) -> Result<bool, UserError> {
        Ok(self
            .state
            .lock()
            .await
            .usernames
            .contains_key(username.as_str()))
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryCredentialStore {
    async fn create(&self, token: &RefreshToken) -> Result<(), RefreshTokenError> {
        let mut state = self.state.lock().await;
        if state.refresh_tokens.contains_key(&token.token) {
            return Err(RefreshTokenError::AlreadyExists);
        }
        state
            .refresh_tokens
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, RefreshTokenError> {
        Ok(self.state.lock().await.refresh_tokens.get(token).cloned())
    }

    async fn find_active_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, RefreshTokenError> {
        Ok(self
            .state
            .lock()
            .await
            .refresh_tokens
            .get(token)
            .filter(|record| !record.revoked)
            .cloned())
    }

    async fn revoke_if_active(&self, token: &str) -> Result<bool, RefreshTokenError> {
        let mut state = self.state.lock().await;
        match state.refresh_tokens.get_mut(token) {
            Some(record) if !record.revoked => {
                record.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        if let Some(record) = self.state.lock().await.refresh_tokens.get_mut(token) {
            record.revoked = true;
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, RefreshTokenError> {
        let mut state = self.state.lock().await;
        let mut revoked = 0;
        for record in state.refresh_tokens.values_mut() {
            if record.user_id == *user_id && !record.revoked {
                record.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RefreshTokenError> {
        let mut state = self.state.lock().await;
        let before = state.refresh_tokens.len();
        state.refresh_tokens.retain(|_, record| record.expires_at >= now);
        Ok((before - state.refresh_tokens.len()) as u64)
    }
}

/// Process-local visit log, one entry per user.
#[derive(Default)]
pub struct InMemoryVisitorRecorder {
    visits: Mutex<HashMap<UserId, Visit>>,
}

impl InMemoryVisitorRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn last_visit(&self, user_id: &UserId) -> Option<Visit> {
        self.visits.lock().await.get(user_id).cloned()
    }
}

#[async_trait]
impl VisitorRecorder for InMemoryVisitorRecorder {
    async fn record_visit(&self, user_id: &UserId) -> Result<(), VisitorError> {
        let mut visits = self.visits.lock().await;
        visits.insert(
            *user_id,
            Visit {
                user_id: *user_id,
                visited_at: Utc::now(),
            },
        );
        Ok(())
    }
}
