use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::user::models::UserId;
use crate::domain::visitor::errors::VisitorError;
use crate::domain::visitor::ports::VisitorRecorder;

pub struct PostgresVisitorRecorder {
    pool: PgPool,
}

impl PostgresVisitorRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn database_error(e: sqlx::Error) -> VisitorError {
    VisitorError::DatabaseError(e.to_string())
}

#[async_trait]
impl VisitorRecorder for PostgresVisitorRecorder {
    async fn record_visit(&self, user_id: &UserId) -> Result<(), VisitorError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query("DELETE FROM visitors WHERE user_id = $1")
            .bind(user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        sqlx::query("INSERT INTO visitors (user_id, visited_at) VALUES ($1, $2)")
            .bind(user_id.0)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        tx.commit().await.map_err(database_error)
    }
}
