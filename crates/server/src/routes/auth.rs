use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::Json as ResponseJson,
    routing::{get, post},
};
use services::services::admin_auth::{AdminIdentity, LoginRequest, LoginResponse};

use crate::{AppState, error::ApiError};

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ResponseJson<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(ResponseJson(state.auth.login(&request).await?))
}

/// GET /api/admin/session
pub async fn session(admin: AdminIdentity) -> ResponseJson<AdminIdentity> {
    ResponseJson(admin)
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/session", get(session))
}
