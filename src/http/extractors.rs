//! Bearer-credential extractors. `StaffAuth` admits any authenticated
//! account; `AdminAuth` additionally requires the ADMIN role.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::AuthContext;
use crate::model::Role;

use super::error::ApiError;
use super::AppState;

pub struct StaffAuth(pub AuthContext);

pub struct AdminAuth(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for StaffAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
        state
            .sessions
            .authenticate(token)
            .map(StaffAuth)
            .ok_or_else(|| ApiError::unauthorized("invalid or expired token"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let StaffAuth(ctx) = StaffAuth::from_request_parts(parts, state).await?;
        if ctx.role != Role::Admin {
            return Err(ApiError::forbidden("administrator role required"));
        }
        Ok(AdminAuth(ctx))
    }
}
