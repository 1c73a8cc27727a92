use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use frontdesk::auth::{hash_password, SessionStore};
use frontdesk::config::Config;
use frontdesk::engine::Engine;
use frontdesk::http::{self, AppState};
use frontdesk::reaper;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    frontdesk::observability::init(config.metrics_port);

    // Ensure data directory exists
    std::fs::create_dir_all(&config.data_dir)?;
    let wal_path = config.data_dir.join("frontdesk.wal");

    let engine = Arc::new(Engine::new(wal_path)?);

    if engine
        .bootstrap_admin(&config.admin_username, hash_password(&config.admin_password))
        .await?
    {
        info!("seeded administrator account '{}'", config.admin_username);
        if config.uses_default_admin_password() {
            tracing::warn!(
                "administrator uses the default password — set FRONTDESK_ADMIN_PASSWORD"
            );
        }
    }

    let sessions = Arc::new(SessionStore::new(config.session_ttl));

    // Background maintenance: expired-session purge + WAL compaction
    let reaper_sessions = sessions.clone();
    tokio::spawn(async move {
        reaper::run_session_reaper(reaper_sessions).await;
    });
    let compactor_engine = engine.clone();
    let threshold = config.compact_threshold;
    tokio::spawn(async move {
        reaper::run_compactor(compactor_engine, threshold).await;
    });

    let app = http::router(AppState { engine, sessions });

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("frontdesk listening on {addr}");
    info!("  data_dir: {}", config.data_dir.display());
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("frontdesk stopped");
    Ok(())
}

/// Resolve on SIGTERM or ctrl-c; axum stops accepting and drains in-flight
/// connections.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
    info!("shutdown signal received");
}
