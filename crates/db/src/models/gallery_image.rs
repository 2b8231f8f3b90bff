use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Portfolio bucket a gallery image is shown under
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "gallery_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GalleryCategory {
    #[default]
    Residential,
    Commercial,
    Furniture,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: Uuid,
    pub title: String,
    pub category: GalleryCategory,
    pub subcategory: String,
    pub description: String,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub project_date: Option<String>,
    pub location: Option<String>,
    pub featured: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateGalleryImage {
    pub title: String,
    pub category: GalleryCategory,
    pub subcategory: String,
    pub description: String,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub project_date: Option<String>,
    pub location: Option<String>,
    pub featured: bool,
    pub sort_order: i64,
}

const SELECT_COLUMNS: &str = r#"
    id, title, category, subcategory, description, image_url, thumbnail_url,
    project_date, location, featured, sort_order, created_at, updated_at
"#;

impl GalleryImage {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateGalleryImage,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, GalleryImage>(&format!(
            r#"INSERT INTO gallery_images
                (id, title, category, subcategory, description, image_url, thumbnail_url,
                 project_date, location, featured, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {SELECT_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(data.category)
        .bind(&data.subcategory)
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(&data.thumbnail_url)
        .bind(&data.project_date)
        .bind(&data.location)
        .bind(data.featured)
        .bind(data.sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, GalleryImage>(&format!(
            "SELECT {SELECT_COLUMNS} FROM gallery_images WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Gallery listing order: explicit sort order first, newest first within a slot.
    pub async fn find_all(
        pool: &SqlitePool,
        category: Option<GalleryCategory>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, GalleryImage>(&format!(
            r#"SELECT {SELECT_COLUMNS}
            FROM gallery_images
            WHERE ($1 IS NULL OR category = $1)
            ORDER BY sort_order ASC, created_at DESC"#
        ))
        .bind(category)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM gallery_images WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
