use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total HTTP requests handled. Labels: method, path, status.
pub const REQUESTS_TOTAL: &str = "frontdesk_requests_total";

/// Histogram: request latency in seconds. Labels: method, path.
pub const REQUEST_DURATION_SECONDS: &str = "frontdesk_request_duration_seconds";

/// Counter: failed login attempts.
pub const AUTH_FAILURES_TOTAL: &str = "frontdesk_auth_failures_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: live bearer sessions.
pub const SESSIONS_ACTIVE: &str = "frontdesk_sessions_active";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "frontdesk_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "frontdesk_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
