use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Append-only chat line, ordered by `timestamp` within its conversation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub message: String,
    pub is_from_user: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatMessage {
    pub conversation_id: Uuid,
    pub message: String,
    pub is_from_user: bool,
}

impl ChatMessage {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateChatMessage,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        Self::create_at(pool, data, id, Utc::now()).await
    }

    pub async fn create_at(
        pool: &SqlitePool,
        data: &CreateChatMessage,
        id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            r#"INSERT INTO chat_messages (id, conversation_id, message, is_from_user, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, message, is_from_user, timestamp"#,
        )
        .bind(id)
        .bind(data.conversation_id)
        .bind(&data.message)
        .bind(data.is_from_user)
        .bind(timestamp)
        .fetch_one(pool)
        .await
    }

    /// Full history of one conversation, oldest first. Rows sharing a
    /// timestamp keep insertion order.
    pub async fn find_by_conversation_id(
        pool: &SqlitePool,
        conversation_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            r#"SELECT id, conversation_id, message, is_from_user, timestamp
            FROM chat_messages
            WHERE conversation_id = $1
            ORDER BY timestamp ASC, rowid ASC"#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
    }
}
