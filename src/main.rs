//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Initializes the document store
//! - Starts the HTTP server with graceful shutdown support

use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dashboard::config::Config;
use dashboard::database::{init_db, AppState, Store};
use dashboard::route::create_app;

/// Application entry point
///
/// 1. Loads environment variables from `.env`
/// 2. Reads the configuration (see [`Config::load`])
/// 3. Opens the embedded database and creates the uploads directory
/// 4. Starts the HTTP server with graceful shutdown handling
#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dashboard=debug,tower_http=debug")),
        )
        .init();

    let config = Config::load();

    let db = init_db(&config.database_url).expect("Failed to initialize database");
    std::fs::create_dir_all(&config.uploads_dir).expect("Failed to create uploads directory");

    let port = config.port;
    info!(database = %config.database_url, uploads = %config.uploads_dir.display(), "storage ready");

    let state = AppState {
        store: Store::new(db),
        config: Arc::new(config),
    };

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");

    info!("Server running at http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM
///
/// In-flight requests are allowed to finish so no write transaction is cut short.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server");
}
