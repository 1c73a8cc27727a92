use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::verify_password;
use crate::model::Role;

use super::error::ApiError;
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub role: Role,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let member = state
        .engine
        .find_staff_by_username(req.username.trim())
        .filter(|m| verify_password(&req.password, &m.password_hash))
        .ok_or_else(|| {
            metrics::counter!(crate::observability::AUTH_FAILURES_TOTAL).increment(1);
            ApiError::unauthorized("invalid credentials")
        })?;

    let token = state.sessions.issue(&member);
    Ok(Json(LoginResponse {
        token,
        user: UserInfo {
            username: member.username,
            role: member.role,
        },
    }))
}
