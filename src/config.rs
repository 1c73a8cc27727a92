use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Process configuration, read from `FRONTDESK_*` environment variables once
/// at startup and immutable afterwards. Components receive what they need at
/// construction — nothing reads the environment past this point.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub metrics_port: Option<u16>,
    pub session_ttl: Duration,
    pub compact_threshold: u64,
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind: std::env::var("FRONTDESK_BIND").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("FRONTDESK_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            data_dir: std::env::var("FRONTDESK_DATA_DIR")
                .unwrap_or_else(|_| "./data".into())
                .into(),
            metrics_port: std::env::var("FRONTDESK_METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
            session_ttl: Duration::from_secs(
                std::env::var("FRONTDESK_SESSION_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8 * 3600),
            ),
            compact_threshold: std::env::var("FRONTDESK_COMPACT_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
            admin_username: std::env::var("FRONTDESK_ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".into()),
            admin_password: std::env::var("FRONTDESK_ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.into()),
        }
    }

    /// True when the seeded admin credentials are the well-known default —
    /// worth a loud warning at startup.
    pub fn uses_default_admin_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}
