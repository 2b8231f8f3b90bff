use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Editable copy for one logical page section (hero, about, services, ...).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SiteContentSection {
    pub id: Uuid,
    pub section: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl SiteContentSection {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SiteContentSection>(
            "SELECT id, section, content, updated_at FROM site_content ORDER BY section ASC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn upsert(pool: &SqlitePool, section: &str, content: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SiteContentSection>(
            r#"INSERT INTO site_content (id, section, content)
            VALUES ($1, $2, $3)
            ON CONFLICT(section) DO UPDATE SET
                content = excluded.content,
                updated_at = datetime('now', 'subsec')
            RETURNING id, section, content, updated_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(section)
        .bind(content)
        .fetch_one(pool)
        .await
    }
}
