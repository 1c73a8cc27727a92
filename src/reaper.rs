use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::auth::SessionStore;
use crate::engine::Engine;

/// Background task that periodically drops expired bearer sessions.
pub async fn run_session_reaper(sessions: Arc<SessionStore>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        let removed = sessions.purge_expired(Utc::now());
        if removed > 0 {
            info!("reaped {removed} expired sessions");
        }
    }
}

/// Background task that compacts the WAL once enough appends accumulate.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));
    loop {
        interval.tick().await;
        let appends = engine.wal_appends_since_compact().await;
        if appends < threshold {
            continue;
        }
        match engine.compact_wal().await {
            Ok(()) => info!("compacted WAL after {appends} appends"),
            Err(e) => tracing::warn!("WAL compaction failed: {e}"),
        }
    }
}
