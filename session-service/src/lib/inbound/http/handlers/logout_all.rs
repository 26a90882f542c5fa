use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::session::ports::SessionServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn logout_all(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<LogoutAllResponseData>, ApiError> {
    state
        .session_service
        .revoke_all_sessions(&authenticated.user_id)
        .await
        .map_err(ApiError::from)
        .map(|revoked| ApiSuccess::new(StatusCode::OK, LogoutAllResponseData { revoked }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutAllResponseData {
    pub revoked: u64,
}
