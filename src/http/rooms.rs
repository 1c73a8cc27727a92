use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use ulid::Ulid;

use crate::engine::RoomPatch;
use crate::model::{Money, Room, RoomStatus};

use super::error::ApiError;
use super::extractors::{AdminAuth, StaffAuth};
use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    pub number: u32,
    #[serde(rename = "type")]
    pub room_type: String,
    pub price_per_night: Money,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoom {
    pub number: Option<u32>,
    #[serde(rename = "type")]
    pub room_type: Option<String>,
    pub price_per_night: Option<Money>,
    pub status: Option<RoomStatus>,
}

pub async fn list(
    _auth: StaffAuth,
    State(state): State<AppState>,
) -> Json<Vec<Room>> {
    Json(state.engine.list_rooms().await)
}

pub async fn create(
    _auth: AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateRoom>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    let room = state
        .engine
        .create_room(req.number, req.room_type, req.price_per_night)
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn update(
    _auth: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<Ulid>,
    Json(req): Json<UpdateRoom>,
) -> Result<Json<Room>, ApiError> {
    let patch = RoomPatch {
        number: req.number,
        room_type: req.room_type,
        price_per_night: req.price_per_night,
        status: req.status,
    };
    Ok(Json(state.engine.update_room(id, patch).await?))
}

pub async fn remove(
    _auth: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<Ulid>,
) -> Result<Json<Value>, ApiError> {
    state.engine.delete_room(id).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}
