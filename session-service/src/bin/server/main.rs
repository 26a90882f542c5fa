use std::sync::Arc;
use std::time::Duration;

use session_service::config::Config;
use session_service::config::StoreBackend;
use session_service::domain::session::ports::SessionServicePort;
use session_service::domain::session::service::SessionService;
use session_service::domain::visitor::ports::VisitorRecorder;
use session_service::inbound::http::router::create_router;
use session_service::outbound::repositories::InMemoryCredentialStore;
use session_service::outbound::repositories::InMemoryVisitorRecorder;
use session_service::outbound::repositories::PostgresRefreshTokenRepository;
use session_service::outbound::repositories::PostgresUserRepository;
use session_service::outbound::repositories::PostgresVisitorRecorder;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "session-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        store_backend = ?config.store.backend,
        store_timeout_secs = config.store.timeout_secs,
        access_token_ttl_secs = config.jwt.access_token_ttl_secs,
        refresh_token_ttl_hours = config.jwt.refresh_token_ttl_hours,
        "Configuration loaded"
    );

    let (session_service, visitor_recorder) = build_services(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup = tokio::spawn(run_cleanup(
        Arc::clone(&session_service),
        config.cleanup_interval(),
        shutdown_rx,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(session_service, visitor_recorder);
    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = cleanup.await {
        tracing::error!(error = %e, "Cleanup task failed");
    }

    tracing::info!("Server exited successfully");
    Ok(())
}

async fn build_services(
    config: &Config,
) -> Result<(Arc<dyn SessionServicePort>, Arc<dyn VisitorRecorder>), anyhow::Error> {
    match config.store.backend {
        StoreBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&config.database.url)
                .await?;
            tracing::info!(
                max_connections = 5,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let session_service: Arc<dyn SessionServicePort> = Arc::new(SessionService::new(
                config.session_config(),
                Arc::new(PostgresUserRepository::new(pg_pool.clone())),
                Arc::new(PostgresRefreshTokenRepository::new(pg_pool.clone())),
            )?);
            let visitor_recorder: Arc<dyn VisitorRecorder> =
                Arc::new(PostgresVisitorRecorder::new(pg_pool));

            Ok((session_service, visitor_recorder))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory credential store; state is lost on restart");

            let store = Arc::new(InMemoryCredentialStore::new());
            let session_service: Arc<dyn SessionServicePort> = Arc::new(SessionService::new(
                config.session_config(),
                Arc::clone(&store),
                store,
            )?);
            let visitor_recorder: Arc<dyn VisitorRecorder> =
                Arc::new(InMemoryVisitorRecorder::new());

            Ok((session_service, visitor_recorder))
        }
    }
}

/// Periodically delete expired refresh tokens until shutdown is signalled.
async fn run_cleanup(
    session_service: Arc<dyn SessionServicePort>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    // First tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match session_service.purge_expired_tokens().await {
                    Ok(deleted) => tracing::info!(deleted, "Expired refresh tokens cleaned up"),
                    Err(e) => tracing::warn!(error = %e, "Refresh token cleanup failed"),
                }
            }
            _ = shutdown.changed() => {
                tracing::info!("Cleanup task stopping");
                break;
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
