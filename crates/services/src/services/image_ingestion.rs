//! Image ingestion: validate, derive renditions, store both (with retry on the
//! cloud backend), then optionally record a gallery entry pointing at them.

use std::{str::FromStr, time::Duration};

use backon::Retryable;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use db::models::gallery_image::{CreateGalleryImage, GalleryCategory, GalleryImage};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::Display;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    admin_auth::AdminIdentity,
    image_processing::{
        self, ImageProcessingError, RENDITION_CONTENT_TYPE, RENDITION_EXTENSION,
    },
    object_storage::{ObjectStore, StorageBackend, StorageError},
};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_UPLOAD_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(1);
const DEFAULT_FOLDER: &str = "gallery";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Rendition {
    Main,
    Thumbnail,
}

#[derive(Debug, Error)]
pub enum ImageIngestionError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("file exceeds the {} MiB limit", .limit / (1024 * 1024))]
    TooLarge { limit: usize },
    #[error(transparent)]
    Processing(#[from] ImageProcessingError),
    #[error("upload failed after {attempts} attempts ({rendition} upload: {source})")]
    StorageUpload {
        attempts: u32,
        rendition: Rendition,
        #[source]
        source: StorageError,
    },
    #[error("could not write image locally: {0}")]
    LocalWrite(#[source] StorageError),
    #[error("failed to save gallery record for {filename}: {source}")]
    RecordCreation {
        filename: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("gallery image {0} not found")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Optional descriptive fields sent alongside the file.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub title: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub project_date: Option<String>,
    pub location: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub category: Option<String>,
    pub metadata: UploadMetadata,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub original_url: String,
    pub thumbnail_url: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub upload: UploadResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery_image: Option<GalleryImage>,
}

/// Filenames for one upload; both share the timestamp and identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNames {
    pub filename: String,
    pub thumbnail: String,
}

impl ObjectNames {
    pub fn generate(now: DateTime<Utc>) -> Self {
        let stem = format!("{}-{}", now.timestamp_millis(), Uuid::new_v4());
        Self {
            filename: format!("{stem}.{RENDITION_EXTENSION}"),
            thumbnail: format!("thumb-{stem}.{RENDITION_EXTENSION}"),
        }
    }
}

/// Lowercased storage folder restricted to `[a-z0-9_-]`.
pub fn storage_folder(category: Option<&str>) -> String {
    let folder: String = category
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if folder.is_empty() {
        DEFAULT_FOLDER.to_string()
    } else {
        folder
    }
}

struct StagedObject {
    rendition: Rendition,
    path: String,
    bytes: Bytes,
}

/// The first put that failed within one attempt.
struct FailedPut {
    rendition: Rendition,
    source: StorageError,
}

/// Delays between attempts: `step`, `2 * step`, ... for [`MAX_UPLOAD_ATTEMPTS`] in total.
#[derive(Debug, Clone)]
struct LinearBackoff {
    step: Duration,
    attempt: u32,
}

impl LinearBackoff {
    fn new(step: Duration) -> Self {
        Self { step, attempt: 0 }
    }
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        self.attempt += 1;
        (self.attempt < MAX_UPLOAD_ATTEMPTS).then(|| self.step * self.attempt)
    }
}

async fn put_all(store: &dyn ObjectStore, objects: &[StagedObject]) -> Result<(), FailedPut> {
    for object in objects {
        store
            .put(&object.path, object.bytes.clone(), RENDITION_CONTENT_TYPE)
            .await
            .map_err(|source| FailedPut {
                rendition: object.rendition,
                source,
            })?;
    }
    Ok(())
}

/// Puts every object in order; any failure restarts the whole attempt.
async fn upload_with_retry(
    store: &dyn ObjectStore,
    objects: &[StagedObject],
    backoff_step: Duration,
) -> Result<(), ImageIngestionError> {
    let mut attempts = 0;
    let result = (|| {
        attempts += 1;
        put_all(store, objects)
    })
    .retry(LinearBackoff::new(backoff_step))
    .notify(|failed: &FailedPut, delay: Duration| {
        warn!(
            rendition = %failed.rendition,
            error = %failed.source,
            "Storage upload failed, retrying after {:.2}s",
            delay.as_secs_f64()
        )
    })
    .await;

    match result {
        Ok(()) => {
            if attempts > 1 {
                info!(attempts, "Storage upload succeeded after retry");
            }
            Ok(())
        }
        Err(FailedPut { rendition, source }) => Err(ImageIngestionError::StorageUpload {
            attempts,
            rendition,
            source,
        }),
    }
}

fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Clone)]
pub struct ImageIngestionService {
    pool: SqlitePool,
    storage: StorageBackend,
    backoff_step: Duration,
}

impl ImageIngestionService {
    pub fn new(pool: SqlitePool, storage: StorageBackend) -> Self {
        Self {
            pool,
            storage,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }

    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    pub async fn list(
        &self,
        category: Option<GalleryCategory>,
    ) -> Result<Vec<GalleryImage>, ImageIngestionError> {
        Ok(GalleryImage::find_all(&self.pool, category).await?)
    }

    pub async fn upload(
        &self,
        admin: &AdminIdentity,
        request: UploadRequest,
    ) -> Result<UploadOutcome, ImageIngestionError> {
        Self::validate(&request)?;

        let renditions = image_processing::create_renditions(request.bytes.to_vec())
            .await?;

        let names = ObjectNames::generate(Utc::now());
        let upload = self
            .store(request.category.as_deref(), &names, renditions)
            .await?;

        info!(
            admin = %admin.username,
            filename = %upload.filename,
            cloud = self.storage.is_cloud(),
            "Image uploaded"
        );

        let gallery_image = self
            .record(&request, &upload)
            .await?;

        Ok(UploadOutcome {
            upload,
            gallery_image,
        })
    }

    fn validate(request: &UploadRequest) -> Result<(), ImageIngestionError> {
        let is_image = request
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"));
        if !is_image {
            return Err(ImageIngestionError::InvalidInput(
                "Only image files are allowed".to_string(),
            ));
        }
        if request.bytes.is_empty() {
            return Err(ImageIngestionError::InvalidInput(
                "Uploaded file is empty".to_string(),
            ));
        }
        if request.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ImageIngestionError::TooLarge {
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }

    async fn store(
        &self,
        category: Option<&str>,
        names: &ObjectNames,
        renditions: image_processing::Renditions,
    ) -> Result<UploadResult, ImageIngestionError> {
        match &self.storage {
            StorageBackend::Cloud(store) => {
                let folder = storage_folder(category);
                let main_path = format!("{folder}/{}", names.filename);
                let thumb_path = format!("{folder}/thumbnails/{}", names.thumbnail);
                let objects = [
                    StagedObject {
                        rendition: Rendition::Main,
                        path: main_path.clone(),
                        bytes: Bytes::from(renditions.display),
                    },
                    StagedObject {
                        rendition: Rendition::Thumbnail,
                        path: thumb_path.clone(),
                        bytes: Bytes::from(renditions.thumbnail),
                    },
                ];
                upload_with_retry(store.as_ref(), &objects, self.backoff_step).await?;

                Ok(UploadResult {
                    original_url: store.public_url(&main_path),
                    thumbnail_url: store.public_url(&thumb_path),
                    filename: names.filename.clone(),
                })
            }
            StorageBackend::Local(local) => {
                let thumb_path = format!("thumbnails/{}", names.thumbnail);
                local
                    .write(&names.filename, &renditions.display)
                    .await
                    .map_err(ImageIngestionError::LocalWrite)?;
                local
                    .write(&thumb_path, &renditions.thumbnail)
                    .await
                    .map_err(ImageIngestionError::LocalWrite)?;

                Ok(UploadResult {
                    original_url: local.url_for(&names.filename),
                    thumbnail_url: local.url_for(&thumb_path),
                    filename: names.filename.clone(),
                })
            }
        }
    }

    /// Creates the gallery record only when title, subcategory and description are all present.
    async fn record(
        &self,
        request: &UploadRequest,
        upload: &UploadResult,
    ) -> Result<Option<GalleryImage>, ImageIngestionError> {
        let meta = &request.metadata;
        let (Some(title), Some(subcategory), Some(description)) = (
            required(&meta.title),
            required(&meta.subcategory),
            required(&meta.description),
        ) else {
            return Ok(None);
        };

        let category = request
            .category
            .as_deref()
            .and_then(|c| GalleryCategory::from_str(c.trim()).ok())
            .unwrap_or_default();

        let data = CreateGalleryImage {
            title,
            category,
            subcategory,
            description,
            image_url: upload.original_url.clone(),
            thumbnail_url: Some(upload.thumbnail_url.clone()),
            project_date: required(&meta.project_date),
            location: required(&meta.location),
            featured: meta.featured.unwrap_or(false),
            sort_order: 0,
        };
        let image = GalleryImage::create(&self.pool, &data, Uuid::new_v4())
            .await
            .map_err(|source| ImageIngestionError::RecordCreation {
                filename: upload.filename.clone(),
                source,
            })?;
        Ok(Some(image))
    }

    /// Best-effort removal of objects this pipeline stored. No-op on the local backend.
    pub async fn remove_objects(&self, urls: &[&str]) {
        let StorageBackend::Cloud(store) = &self.storage else {
            return;
        };
        let paths: Vec<String> = urls
            .iter()
            .filter_map(|url| store.path_from_url(url))
            .collect();
        if paths.is_empty() {
            return;
        }
        if let Err(e) = store.remove(&paths).await {
            warn!(paths = ?paths, error = %e, "Could not remove stored objects");
        }
    }

    pub async fn delete(&self, admin: &AdminIdentity, id: Uuid) -> Result<(), ImageIngestionError> {
        let image = GalleryImage::find_by_id(&self.pool, id)
            .await?
            .ok_or(ImageIngestionError::NotFound(id))?;

        let mut urls = vec![image.image_url.as_str()];
        if let Some(thumbnail) = image.thumbnail_url.as_deref() {
            urls.push(thumbnail);
        }
        self.remove_objects(&urls).await;

        GalleryImage::delete(&self.pool, id).await?;
        info!(admin = %admin.username, image_id = %id, "Gallery image deleted");
        Ok(())
    }
}
