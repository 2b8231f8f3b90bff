use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// One chat widget session. A fresh row starts active with no messages.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ChatConversation {
    pub id: Uuid,
    pub session_id: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatConversation {
    pub session_id: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

impl ChatConversation {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateChatConversation,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ChatConversation>(
            r#"INSERT INTO chat_conversations (id, session_id, user_email, user_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, session_id, user_email, user_name, is_active, created_at, updated_at"#,
        )
        .bind(id)
        .bind(&data.session_id)
        .bind(&data.user_email)
        .bind(&data.user_name)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatConversation>(
            r#"SELECT id, session_id, user_email, user_name, is_active, created_at, updated_at
            FROM chat_conversations
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Mark the conversation active and bump `updated_at` after a message lands.
    pub async fn touch(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE chat_conversations
            SET is_active = 1,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1"#,
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
