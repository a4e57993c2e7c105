use std::sync::Arc;

use vocabot::config::Config;
use vocabot::db::Database;
use vocabot::services::lookup::HttpLookupProvider;
use vocabot::state::AppState;
use vocabot::{create_app, logging};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let _log_guard = logging::init_tracing(&config.log_level);

    let db = match Database::connect(&config.database_path).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, path = %config.database_path.display(), "database init failed");
            return;
        }
    };

    let lookup = HttpLookupProvider::from_env();
    if !lookup.is_available() {
        tracing::warn!("LOOKUP_API_ENDPOINT not set; word lookups will fail until configured");
    }

    let state = AppState::new(db, Arc::new(lookup));
    let app = create_app(state);

    let addr = config.bind_addr();
    tracing::info!(%addr, "vocabot listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "bind failed");
            return;
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
