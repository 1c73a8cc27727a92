//! JSON-over-HTTP boundary. Routes translate requests into engine calls and
//! engine errors into status codes; no business logic lives here.

mod auth;
mod dashboard;
pub mod error;
pub mod extractors;
mod reservations;
mod rooms;
mod staff;

pub use error::ApiError;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::SessionStore;
use crate::engine::Engine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub sessions: Arc<SessionStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/rooms", get(rooms::list).post(rooms::create))
        .route("/api/rooms/:id", put(rooms::update).delete(rooms::remove))
        .route(
            "/api/reservations",
            get(reservations::list).post(reservations::create),
        )
        .route("/api/reservations/:id/checkin", put(reservations::check_in))
        .route("/api/reservations/:id/checkout", put(reservations::check_out))
        .route("/api/reservations/:id/cancel", put(reservations::cancel))
        .route("/api/staff", get(staff::list).post(staff::create))
        .route("/api/staff/:id", delete(staff::remove))
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route_layer(axum::middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Per-request RED metrics, labeled by matched route (not the raw path, which
/// would explode cardinality with every id).
async fn track_metrics(req: Request, next: Next) -> Response {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    metrics::counter!(
        crate::observability::REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!(
        crate::observability::REQUEST_DURATION_SECONDS,
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}
