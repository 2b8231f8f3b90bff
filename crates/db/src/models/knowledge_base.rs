use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Free-form grounding fact fed to the chat assistant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseEntry {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateKnowledgeBaseEntry {
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKnowledgeBaseEntry {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

const COLUMNS: &str = "id, title, content, category, is_active, created_at, updated_at";

impl KnowledgeBaseEntry {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateKnowledgeBaseEntry,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, KnowledgeBaseEntry>(&format!(
            r#"INSERT INTO chat_knowledge_base (id, title, content, category, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(&data.category)
        .bind(data.is_active)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, KnowledgeBaseEntry>(&format!(
            "SELECT {COLUMNS} FROM chat_knowledge_base WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, KnowledgeBaseEntry>(&format!(
            "SELECT {COLUMNS} FROM chat_knowledge_base ORDER BY category ASC, created_at ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_active(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, KnowledgeBaseEntry>(&format!(
            r#"SELECT {COLUMNS}
            FROM chat_knowledge_base
            WHERE is_active = 1
            ORDER BY category ASC, created_at ASC"#
        ))
        .fetch_all(pool)
        .await
    }

    /// Applies a partial update. Returns `None` when the entry does not exist.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateKnowledgeBaseEntry,
    ) -> Result<Option<Self>, sqlx::Error> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        sqlx::query_as::<_, KnowledgeBaseEntry>(&format!(
            r#"UPDATE chat_knowledge_base
            SET title = $2,
                content = $3,
                category = $4,
                is_active = $5,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1
            RETURNING {COLUMNS}"#
        ))
        .bind(id)
        .bind(data.title.as_ref().unwrap_or(&current.title))
        .bind(data.content.as_ref().unwrap_or(&current.content))
        .bind(data.category.as_ref().unwrap_or(&current.category))
        .bind(data.is_active.unwrap_or(current.is_active))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chat_knowledge_base WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
