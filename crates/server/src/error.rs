use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use services::services::{
    admin_auth::AdminAuthError, chat_admin::ChatAdminError, chat_assistant::ChatAssistantError,
    image_ingestion::ImageIngestionError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    ChatAssistant(#[from] ChatAssistantError),
    #[error(transparent)]
    ChatAdmin(#[from] ChatAdminError),
    #[error(transparent)]
    ImageIngestion(#[from] ImageIngestionError),
    #[error(transparent)]
    AdminAuth(#[from] AdminAuthError),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    JsonBody(#[from] JsonRejection),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    /// Status, caller-facing message and short error category.
    fn parts(&self) -> (StatusCode, String, &'static str) {
        const INTERNAL: &str = "Internal server error";
        const TOO_LARGE: &str = "File exceeds the 10 MiB limit";
        match self {
            ApiError::ChatAssistant(err) => match err {
                ChatAssistantError::EmptyMessage => (
                    StatusCode::BAD_REQUEST,
                    "Message is required".to_string(),
                    "validation",
                ),
                ChatAssistantError::ConversationNotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "Conversation not found".to_string(),
                    "not_found",
                ),
                ChatAssistantError::Generation { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process message".to_string(),
                    "generation",
                ),
                ChatAssistantError::RecordCreation { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process message".to_string(),
                    "record_creation",
                ),
                ChatAssistantError::Database(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL.to_string(),
                    "database",
                ),
            },
            ApiError::ChatAdmin(err) => match err {
                ChatAdminError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, msg.clone(), "validation")
                }
                ChatAdminError::EntryNotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "Knowledge base entry not found".to_string(),
                    "not_found",
                ),
                ChatAdminError::Database(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL.to_string(),
                    "database",
                ),
            },
            ApiError::ImageIngestion(err) => match err {
                ImageIngestionError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, msg.clone(), "invalid_input")
                }
                ImageIngestionError::TooLarge { .. } => (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    TOO_LARGE.to_string(),
                    "payload_too_large",
                ),
                ImageIngestionError::Processing(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process image".to_string(),
                    "processing",
                ),
                ImageIngestionError::StorageUpload { attempts, .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("upload failed after {attempts} attempts"),
                    "storage",
                ),
                ImageIngestionError::LocalWrite(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store image".to_string(),
                    "storage",
                ),
                ImageIngestionError::RecordCreation { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Image uploaded but the gallery record could not be saved".to_string(),
                    "record_creation",
                ),
                ImageIngestionError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "Gallery image not found".to_string(),
                    "not_found",
                ),
                ImageIngestionError::Database(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL.to_string(),
                    "database",
                ),
            },
            ApiError::AdminAuth(err) => match err {
                AdminAuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid username or password".to_string(),
                    "authentication",
                ),
                AdminAuthError::MissingToken | AdminAuthError::InvalidToken(_) => (
                    StatusCode::UNAUTHORIZED,
                    "Authentication required".to_string(),
                    "authentication",
                ),
                AdminAuthError::Hashing(_) | AdminAuthError::Database(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL.to_string(),
                    "internal",
                ),
            },
            ApiError::Multipart(err) => {
                let status = err.status();
                if status == StatusCode::PAYLOAD_TOO_LARGE {
                    (status, TOO_LARGE.to_string(), "payload_too_large")
                } else {
                    (status, err.body_text(), "invalid_input")
                }
            }
            ApiError::JsonBody(_) => (
                StatusCode::BAD_REQUEST,
                "Invalid request body".to_string(),
                "validation",
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "validation"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, category) = self.parts();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), category, error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), category, error = %self, "Request rejected");
        }

        let body = Json(json!({
            "message": message,
            "error": category,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use services::services::{
        object_storage::StorageError, response_generator::GenerationError,
    };

    use super::*;

    #[test]
    fn storage_exhaustion_reports_attempts_without_internal_detail() {
        let err = ApiError::from(ImageIngestionError::StorageUpload {
            attempts: 3,
            rendition: services::services::image_ingestion::Rendition::Thumbnail,
            source: StorageError::Http {
                status: 503,
                body: "secret upstream detail".to_string(),
            },
        });
        let (status, message, category) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "upload failed after 3 attempts");
        assert_eq!(category, "storage");
    }

    #[test]
    fn generation_failures_use_a_generic_message() {
        let err = ApiError::from(ChatAssistantError::Generation {
            conversation_id: uuid::Uuid::new_v4(),
            source: GenerationError::Failed("api key rejected".to_string()),
        });
        let (status, message, _) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Failed to process message");
    }

    #[test]
    fn oversized_files_are_payload_too_large() {
        let (status, message, category) = ApiError::from(ImageIngestionError::TooLarge {
            limit: services::services::image_ingestion::MAX_UPLOAD_BYTES,
        })
        .parts();
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(message, "File exceeds the 10 MiB limit");
        assert_eq!(category, "payload_too_large");
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        let (status, _, category) = ApiError::from(AdminAuthError::MissingToken).parts();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(category, "authentication");
    }
}
