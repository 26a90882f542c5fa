use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::UserId;

/// Most recent visit of a user. One row per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub user_id: UserId,
    pub visited_at: DateTime<Utc>,
}
