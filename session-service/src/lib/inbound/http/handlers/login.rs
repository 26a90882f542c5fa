use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::user::models::UserId;
use crate::domain::visitor::ports::VisitorRecorder;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let user = state
        .session_service
        .login(&body.username, &body.password)
        .await?;

    let pair = state.session_service.issue_token_pair(&user.id).await?;

    spawn_visit_recording(&state, user.id);

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LoginResponseData {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
            user: (&user).into(),
        },
    ))
}

/// Record the visit on a detached task. The response does not wait for it and
/// a dropped client connection does not cancel it.
fn spawn_visit_recording(state: &AppState, user_id: UserId) {
    let recorder = Arc::clone(&state.visitor_recorder);
    let budget = state.visit_timeout;

    tokio::spawn(async move {
        match tokio::time::timeout(budget, recorder.record_visit(&user_id)).await {
            Ok(Ok(())) => tracing::debug!(user_id = %user_id, "Visit recorded"),
            Ok(Err(e)) => tracing::warn!(user_id = %user_id, error = %e, "Failed to record visit"),
            Err(_) => tracing::warn!(
                user_id = %user_id,
                timeout_ms = budget.as_millis() as u64,
                "Visit recording timed out"
            ),
        }
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "user_name")]
    username: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: UserData,
}
