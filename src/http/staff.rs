use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use ulid::Ulid;

use crate::auth::hash_password;
use crate::limits::MIN_PASSWORD_LEN;
use crate::model::{Role, StaffInfo};

use super::error::ApiError;
use super::extractors::AdminAuth;
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateStaff {
    pub username: String,
    pub password: String,
}

pub async fn list(
    _auth: AdminAuth,
    State(state): State<AppState>,
) -> Json<Vec<StaffInfo>> {
    Json(state.engine.list_staff())
}

pub async fn create(
    _auth: AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateStaff>,
) -> Result<(StatusCode, Json<StaffInfo>), ApiError> {
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let info = state
        .engine
        .create_staff(req.username, hash_password(&req.password), Role::Staff)
        .await?;
    Ok((StatusCode::CREATED, Json(info)))
}

pub async fn remove(
    _auth: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<Ulid>,
) -> Result<Json<Value>, ApiError> {
    state.engine.delete_staff(id).await?;
    Ok(Json(json!({ "message": "Staff deleted" })))
}
