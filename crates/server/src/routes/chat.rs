use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    chat_conversation::{ChatConversation, CreateChatConversation},
    chat_message::ChatMessage,
    chat_settings::{ChatSettings, PublicChatSettings, UpdateChatSettings},
};
use services::services::{
    admin_auth::AdminIdentity,
    chat_assistant::{PostChatMessage, PostMessageOutcome},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// GET /api/chat/settings
pub async fn get_public_settings(
    State(state): State<AppState>,
) -> Result<ResponseJson<PublicChatSettings>, ApiError> {
    Ok(ResponseJson(state.chat_admin.public_settings().await?))
}

/// GET /api/admin/chat/settings
pub async fn get_settings(
    State(state): State<AppState>,
    admin: AdminIdentity,
) -> Result<ResponseJson<ChatSettings>, ApiError> {
    Ok(ResponseJson(state.chat_admin.settings(&admin).await?))
}

/// PUT /api/chat/settings
pub async fn update_settings(
    State(state): State<AppState>,
    admin: AdminIdentity,
    payload: Result<Json<UpdateChatSettings>, JsonRejection>,
) -> Result<ResponseJson<ChatSettings>, ApiError> {
    let Json(update) = payload?;
    Ok(ResponseJson(
        state.chat_admin.update_settings(&admin, update).await?,
    ))
}

/// POST /api/chat/conversations
pub async fn start_conversation(
    State(state): State<AppState>,
    payload: Result<Json<CreateChatConversation>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ChatConversation>), ApiError> {
    let Json(data) = payload?;
    if data.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest("sessionId is required".to_string()));
    }
    let conversation = state.chat.start_conversation(data).await?;
    Ok((StatusCode::CREATED, ResponseJson(conversation)))
}

/// GET /api/chat/conversations/{id}/messages
pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<ResponseJson<Vec<ChatMessage>>, ApiError> {
    Ok(ResponseJson(state.chat.history(conversation_id).await?))
}

/// POST /api/chat/messages
pub async fn post_message(
    State(state): State<AppState>,
    payload: Result<Json<PostChatMessage>, JsonRejection>,
) -> Result<ResponseJson<PostMessageOutcome>, ApiError> {
    let Json(payload) = payload?;
    Ok(ResponseJson(state.chat.post_message(payload).await?))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/chat/settings",
            get(get_public_settings).put(update_settings),
        )
        .route("/admin/chat/settings", get(get_settings))
        .route("/chat/conversations", post(start_conversation))
        .route("/chat/conversations/{id}/messages", get(get_messages))
        .route("/chat/messages", post(post_message))
}
