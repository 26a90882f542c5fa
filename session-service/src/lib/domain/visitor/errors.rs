use thiserror::Error;

/// Error for visit recording
#[derive(Debug, Clone, Error)]
pub enum VisitorError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}
