use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use ulid::Ulid;

use crate::model::ReservationView;

use super::error::ApiError;
use super::extractors::StaffAuth;
use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservation {
    pub room_id: Ulid,
    pub guest_name: String,
    pub guest_phone: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

pub async fn list(
    _auth: StaffAuth,
    State(state): State<AppState>,
) -> Json<Vec<ReservationView>> {
    Json(state.engine.list_reservations().await)
}

pub async fn create(
    _auth: StaffAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateReservation>,
) -> Result<(StatusCode, Json<ReservationView>), ApiError> {
    let view = state
        .engine
        .create_reservation(
            req.room_id,
            req.guest_name,
            req.guest_phone,
            req.check_in,
            req.check_out,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn check_in(
    _auth: StaffAuth,
    State(state): State<AppState>,
    Path(id): Path<Ulid>,
) -> Result<Json<ReservationView>, ApiError> {
    Ok(Json(state.engine.check_in(id).await?))
}

pub async fn check_out(
    _auth: StaffAuth,
    State(state): State<AppState>,
    Path(id): Path<Ulid>,
) -> Result<Json<ReservationView>, ApiError> {
    Ok(Json(state.engine.check_out(id).await?))
}

pub async fn cancel(
    _auth: StaffAuth,
    State(state): State<AppState>,
    Path(id): Path<Ulid>,
) -> Result<Json<ReservationView>, ApiError> {
    Ok(Json(state.engine.cancel_reservation(id).await?))
}
