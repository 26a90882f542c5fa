use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::session::errors::SessionError;
use crate::domain::user::models::User;

pub mod current_user;
pub mod login;
pub mod logout;
pub mod logout_all;
pub mod refresh;
pub mod register;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    ServiceUnavailable(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidCredentials
            | SessionError::InvalidToken(_)
            | SessionError::TokenExpired
            | SessionError::TokenRevoked => ApiError::Unauthorized(err.to_string()),
            SessionError::UserExists(_) => ApiError::Conflict(err.to_string()),
            SessionError::InvalidUsername(_) | SessionError::InvalidPassword(_) => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            SessionError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            SessionError::StoreTimeout => {
                ApiError::ServiceUnavailable("Service temporarily unavailable".to_string())
            }
            SessionError::Password(_) | SessionError::Signing(_) | SessionError::Store(_) => {
                // Details stay in the log.
                tracing::error!(error = %err, "Session operation failed");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub is_admin: bool,
    pub registered_at: DateTime<Utc>,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.as_str().to_string(),
            avatar: user.avatar.clone(),
            is_admin: user.is_admin,
            registered_at: user.registered_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_are_unauthorized() {
        for err in [
            SessionError::InvalidCredentials,
            SessionError::TokenExpired,
            SessionError::TokenRevoked,
            SessionError::InvalidToken("bad".to_string()),
        ] {
            assert!(matches!(ApiError::from(err), ApiError::Unauthorized(_)));
        }
    }

    #[test]
    fn test_store_errors_do_not_leak() {
        assert_eq!(
            ApiError::from(SessionError::Store("password=secret".to_string())),
            ApiError::InternalServerError("Internal server error".to_string())
        );
        assert!(matches!(
            ApiError::from(SessionError::StoreTimeout),
            ApiError::ServiceUnavailable(_)
        ));
    }

    #[test]
    fn test_conflict_mentions_already_exists() {
        let err = ApiError::from(SessionError::UserExists("alice".to_string()));
        assert_eq!(
            err,
            ApiError::Conflict("Username already exists: alice".to_string())
        );
    }
}
