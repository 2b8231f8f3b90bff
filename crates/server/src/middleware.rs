use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use services::services::admin_auth::AdminIdentity;

use crate::{AppState, error::ApiError};

/// Admin handlers take an [`AdminIdentity`] argument; extraction fails with 401.
impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        Ok(state.auth.authenticate(header)?)
    }
}
