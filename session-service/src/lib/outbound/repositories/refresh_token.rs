use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::session::errors::RefreshTokenError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::user::models::UserId;

#[derive(FromRow)]
struct RefreshTokenRow {
    user_id: Uuid,
    token: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    revoked: bool,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(row: RefreshTokenRow) -> Self {
        RefreshToken {
            user_id: UserId(row.user_id),
            token: row.token,
            expires_at: row.expires_at,
            created_at: row.created_at,
            revoked: row.revoked,
        }
    }
}

fn database_error(e: sqlx::Error) -> RefreshTokenError {
    RefreshTokenError::DatabaseError(e.to_string())
}

pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn create(&self, token: &RefreshToken) -> Result<(), RefreshTokenError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at, created_at, revoked)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id.0)
        .bind(token.expires_at)
        .bind(token.created_at)
        .bind(token.revoked)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => RefreshTokenError::AlreadyExists,
            _ => database_error(e),
        })?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, RefreshTokenError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT user_id, token, expires_at, created_at, revoked
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.map(RefreshToken::from))
    }

    async fn find_active_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, RefreshTokenError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT user_id, token, expires_at, created_at, revoked
            FROM refresh_tokens
            WHERE token = $1 AND revoked = FALSE
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.map(RefreshToken::from))
    }

    async fn revoke_if_active(&self, token: &str) -> Result<bool, RefreshTokenError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token = $1 AND revoked = FALSE
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, RefreshTokenError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RefreshTokenError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}
