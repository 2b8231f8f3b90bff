use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::knowledge_base::{
    CreateKnowledgeBaseEntry, KnowledgeBaseEntry, UpdateKnowledgeBaseEntry,
};
use services::services::admin_auth::AdminIdentity;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub async fn list_entries(
    State(state): State<AppState>,
    admin: AdminIdentity,
) -> Result<ResponseJson<Vec<KnowledgeBaseEntry>>, ApiError> {
    Ok(ResponseJson(state.chat_admin.list_entries(&admin).await?))
}

pub async fn get_entry(
    State(state): State<AppState>,
    admin: AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<KnowledgeBaseEntry>, ApiError> {
    Ok(ResponseJson(state.chat_admin.get_entry(&admin, id).await?))
}

pub async fn create_entry(
    State(state): State<AppState>,
    admin: AdminIdentity,
    payload: Result<Json<CreateKnowledgeBaseEntry>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<KnowledgeBaseEntry>), ApiError> {
    let Json(data) = payload?;
    let entry = state.chat_admin.create_entry(&admin, data).await?;
    Ok((StatusCode::CREATED, ResponseJson(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    admin: AdminIdentity,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateKnowledgeBaseEntry>, JsonRejection>,
) -> Result<ResponseJson<KnowledgeBaseEntry>, ApiError> {
    let Json(data) = payload?;
    Ok(ResponseJson(
        state.chat_admin.update_entry(&admin, id, data).await?,
    ))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    admin: AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.chat_admin.delete_entry(&admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().nest(
        "/chat/knowledge-base",
        Router::new()
            .route("/", get(list_entries).post(create_entry))
            .route(
                "/{id}",
                get(get_entry).put(update_entry).delete(delete_entry),
            ),
    )
}
