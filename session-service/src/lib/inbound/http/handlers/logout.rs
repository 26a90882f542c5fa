use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiSuccess;
use super::MessageData;
use crate::domain::session::ports::SessionServicePort;
use crate::inbound::http::router::AppState;

/// Logout always succeeds. A missing or unparseable body, or an unknown
/// token, only means there is nothing to revoke.
pub async fn logout(State(state): State<AppState>, body: Bytes) -> ApiSuccess<MessageData> {
    let refresh_token = serde_json::from_slice::<LogoutRequest>(&body)
        .ok()
        .and_then(|request| request.refresh_token)
        .filter(|token| !token.is_empty());

    if let Some(token) = refresh_token {
        state.session_service.revoke_refresh_token(&token).await;
    }

    ApiSuccess::new(
        StatusCode::OK,
        MessageData {
            message: "Logged out".to_string(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}
