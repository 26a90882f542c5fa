use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::current_user::current_user;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::logout_all::logout_all;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::middleware::authenticate as auth_middleware;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::visitor::ports::VisitorRecorder;

/// Budget for the detached visit recording after login
pub const DEFAULT_VISIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<dyn SessionServicePort>,
    pub visitor_recorder: Arc<dyn VisitorRecorder>,
    pub visit_timeout: Duration,
}

pub fn create_router(
    session_service: Arc<dyn SessionServicePort>,
    visitor_recorder: Arc<dyn VisitorRecorder>,
) -> Router {
    let state = AppState {
        session_service,
        visitor_recorder,
        visit_timeout: DEFAULT_VISIT_TIMEOUT,
    };

    let public_routes = Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh", post(refresh))
        .route("/api/v1/auth/logout", post(logout));

    let protected_routes = Router::new()
        .route("/api/v1/auth/logout-all", post(logout_all))
        .route("/api/v1/users/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Headers are left out of the span: they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::session::models::SessionConfig;
    use crate::domain::session::service::SessionService;
    use crate::outbound::repositories::memory::InMemoryCredentialStore;
    use crate::outbound::repositories::memory::InMemoryVisitorRecorder;

    fn router() -> Router {
        let store = Arc::new(InMemoryCredentialStore::new());
        let service =
            SessionService::new(SessionConfig::new("router-test-secret"), store.clone(), store)
                .unwrap();
        create_router(Arc::new(service), Arc::new(InMemoryVisitorRecorder::new()))
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        for (method, uri) in [
            (Method::GET, "/api/v1/users/me"),
            (Method::POST, "/api/v1/auth/logout-all"),
        ] {
            let response = router().oneshot(request(method, uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_logout_accepts_empty_body() {
        let response = router()
            .oneshot(request(Method::POST, "/api/v1/auth/logout"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = router()
            .oneshot(request(Method::GET, "/api/v1/nothing-here"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
