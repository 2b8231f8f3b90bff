use std::str::FromStr;

use axum::{
    Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartRejection,
    },
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use bytes::Bytes;
use db::models::gallery_image::{GalleryCategory, GalleryImage};
use serde::{Deserialize, Serialize};
use services::services::{
    admin_auth::AdminIdentity,
    image_ingestion::{MAX_UPLOAD_BYTES, UploadMetadata, UploadOutcome, UploadRequest},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Headroom for multipart boundaries and text fields on top of the file limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub outcome: UploadOutcome,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /api/gallery
pub async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Result<ResponseJson<Vec<GalleryImage>>, ApiError> {
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(
            GalleryCategory::from_str(raw)
                .map_err(|_| ApiError::BadRequest(format!("unknown category: {raw}")))?,
        ),
    };
    Ok(ResponseJson(state.images.list(category).await?))
}

/// POST /api/gallery/upload (multipart: `image` file plus optional text fields)
pub async fn upload_image(
    State(state): State<AppState>,
    admin: AdminIdentity,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ResponseJson<UploadResponse>, ApiError> {
    let mut multipart = multipart
        .map_err(|_| ApiError::BadRequest("Expected multipart form data".to_string()))?;
    let mut file: Option<(Bytes, Option<String>)> = None;
    let mut category = None;
    let mut metadata = UploadMetadata::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_some() || name == "image" {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            file = Some((bytes, content_type));
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "category" => category = Some(value),
            "title" => metadata.title = Some(value),
            "subcategory" => metadata.subcategory = Some(value),
            "description" => metadata.description = Some(value),
            "projectDate" => metadata.project_date = Some(value),
            "location" => metadata.location = Some(value),
            "featured" => metadata.featured = Some(matches!(value.trim(), "true" | "1" | "on")),
            _ => {}
        }
    }

    let Some((bytes, content_type)) = file.filter(|(bytes, _)| !bytes.is_empty()) else {
        return Err(ApiError::BadRequest("No file provided".to_string()));
    };

    let outcome = state
        .images
        .upload(
            &admin,
            UploadRequest {
                bytes,
                content_type,
                category,
                metadata,
            },
        )
        .await?;

    let message = if outcome.gallery_image.is_some() {
        "Image uploaded and gallery entry created"
    } else {
        "Image uploaded"
    };
    Ok(ResponseJson(UploadResponse { message, outcome }))
}

/// DELETE /api/gallery/{id}
pub async fn delete_image(
    State(state): State<AppState>,
    admin: AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<MessageResponse>, ApiError> {
    state.images.delete(&admin, id).await?;
    Ok(ResponseJson(MessageResponse {
        message: "Gallery image deleted",
    }))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/gallery", get(list_images))
        .route(
            "/gallery/upload",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD)),
        )
        .route("/gallery/{id}", delete(delete_image))
}
