use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use enercast_db::{MemoryRecordStore, PgRecordStore, RecordStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enercast_api::background::status_retention;
use enercast_api::config::{ServerConfig, StoreBackend};
use enercast_api::router::build_app_router;
use enercast_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "enercast_api=debug,enercast_core=debug,enercast_db=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = ?config.store_backend,
        predict_program = %config.predict.command.program,
        "Loaded server configuration"
    );

    // --- Record store ---
    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

            let pool = enercast_db::create_pool(&database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            enercast_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            enercast_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgRecordStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory record store; data is lost on restart");
            Arc::new(MemoryRecordStore::new())
        }
    };

    // --- App state ---
    let state = AppState::new(store, config.clone());

    // --- Job status retention ---
    let retention_cancel = tokio_util::sync::CancellationToken::new();
    let retention_handle = tokio::spawn(status_retention::run(
        Arc::clone(&state.jobs),
        config.job_status_ttl_secs,
        retention_cancel.clone(),
    ));

    // --- Router ---
    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    // Running prediction processes are left to finish on their own.
    tracing::info!("Server stopped accepting connections, cleaning up");

    retention_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("Job status retention stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
