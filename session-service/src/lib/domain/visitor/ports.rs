use async_trait::async_trait;

use crate::domain::user::models::UserId;
use crate::domain::visitor::errors::VisitorError;

/// Records that a user signed in.
///
/// Called off the request path after a successful login; implementations
/// replace any earlier visit of the same user.
#[async_trait]
pub trait VisitorRecorder: Send + Sync + 'static {
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn record_visit(&self, user_id: &UserId) -> Result<(), VisitorError>;
}
