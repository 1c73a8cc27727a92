use axum::extract::State;
use axum::Json;

use crate::model::DashboardStats;

use super::extractors::StaffAuth;
use super::AppState;

pub async fn stats(
    _auth: StaffAuth,
    State(state): State<AppState>,
) -> Json<DashboardStats> {
    Json(state.engine.dashboard_stats().await)
}
