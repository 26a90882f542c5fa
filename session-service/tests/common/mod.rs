use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use session_service::domain::session::clock::ManualClock;
use session_service::domain::session::models::SessionConfig;
use session_service::domain::session::service::SessionService;
use session_service::inbound::http::router::create_router;
use session_service::outbound::repositories::InMemoryCredentialStore;
use session_service::outbound::repositories::InMemoryVisitorRecorder;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use sqlx::PgPool;

pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server on the in-memory store
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub clock: Arc<ManualClock>,
    pub visitor_recorder: Arc<InMemoryVisitorRecorder>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(InMemoryCredentialStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let session_service = SessionService::new(
            SessionConfig::new(TEST_SECRET),
            Arc::clone(&store),
            store,
        )
        .expect("Failed to create session service")
        .with_clock(clock.clone());

        let visitor_recorder = Arc::new(InMemoryVisitorRecorder::new());
        let router = create_router(Arc::new(session_service), visitor_recorder.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            clock,
            visitor_recorder,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Register a user and assert it was created
    pub async fn register(&self, username: &str, password: &str) -> serde_json::Value {
        let response = self
            .post("/api/v1/auth/register")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in and return the response body
    pub async fn login(&self, username: &str, password: &str) -> serde_json::Value {
        let response = self
            .post("/api/v1/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Failed to parse response")
    }
}

/// Throwaway Postgres database with migrations applied.
///
/// Only available when `DATABASE_URL` points at a server that allows
/// `CREATE DATABASE`; the database is dropped again on `Drop`.
pub struct TestDb {
    pub pool: PgPool,
    pub db_name: String,
    postgres_url: String,
}

impl TestDb {
    /// Create a uniquely named database, or `None` when `DATABASE_URL` is unset
    pub async fn new() -> Option<Self> {
        let Ok(postgres_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL is not set, skipping Postgres test");
            return None;
        };

        let db_name = format!(
            "test_session_service_{}",
            uuid::Uuid::new_v4().to_string().replace('-', "_")
        );

        let mut conn = PgConnection::connect(&postgres_url)
            .await
            .expect("Failed to connect to Postgres");
        conn.execute(format!(r#"CREATE DATABASE "{}";"#, db_name).as_str())
            .await
            .expect("Failed to create test database");

        let options = postgres_url
            .parse::<PgConnectOptions>()
            .expect("Failed to parse DATABASE_URL")
            .database(&db_name);
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Some(Self {
            pool,
            db_name,
            postgres_url,
        })
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        // Database cleanup happens asynchronously
        let db_name = self.db_name.clone();
        let postgres_url = self.postgres_url.clone();
        tokio::spawn(async move {
            if let Ok(mut conn) = PgConnection::connect(&postgres_url).await {
                let _ = conn
                    .execute(
                        format!(
                            r#"SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}';"#,
                            db_name
                        )
                        .as_str(),
                    )
                    .await;
                let _ = conn
                    .execute(format!(r#"DROP DATABASE IF EXISTS "{}";"#, db_name).as_str())
                    .await;
            }
        });
    }
}
