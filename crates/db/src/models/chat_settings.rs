use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! Welcome to our interior design studio. \
     How can I help you bring your space to life today?";

/// Voice the assistant answers in
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "chat_tone", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatTone {
    #[default]
    Professional,
    Friendly,
    Casual,
}

/// The singleton assistant configuration row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettings {
    pub is_enabled: bool,
    pub welcome_message: String,
    pub tone: ChatTone,
    pub restrict_to_relevant_topics: bool,
    pub updated_at: DateTime<Utc>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            is_enabled: true,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            tone: ChatTone::default(),
            restrict_to_relevant_topics: true,
            updated_at: Utc::now(),
        }
    }
}

/// What visitors are allowed to see.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PublicChatSettings {
    pub is_enabled: bool,
    pub welcome_message: String,
    pub tone: ChatTone,
}

impl From<ChatSettings> for PublicChatSettings {
    fn from(settings: ChatSettings) -> Self {
        Self {
            is_enabled: settings.is_enabled,
            welcome_message: settings.welcome_message,
            tone: settings.tone,
        }
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatSettings {
    pub is_enabled: Option<bool>,
    pub welcome_message: Option<String>,
    pub tone: Option<ChatTone>,
    pub restrict_to_relevant_topics: Option<bool>,
}

impl ChatSettings {
    pub async fn find(pool: &SqlitePool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatSettings>(
            r#"SELECT is_enabled, welcome_message, tone, restrict_to_relevant_topics, updated_at
            FROM chat_settings
            WHERE id = 1"#,
        )
        .fetch_optional(pool)
        .await
    }

    /// Current settings, or the defaults when no row has been written yet.
    pub async fn find_or_default(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        Ok(Self::find(pool).await?.unwrap_or_default())
    }

    pub async fn upsert(pool: &SqlitePool, update: &UpdateChatSettings) -> Result<Self, sqlx::Error> {
        let current = Self::find_or_default(pool).await?;
        let is_enabled = update.is_enabled.unwrap_or(current.is_enabled);
        let welcome_message = update
            .welcome_message
            .clone()
            .unwrap_or(current.welcome_message);
        let tone = update.tone.unwrap_or(current.tone);
        let restrict = update
            .restrict_to_relevant_topics
            .unwrap_or(current.restrict_to_relevant_topics);

        sqlx::query_as::<_, ChatSettings>(
            r#"INSERT INTO chat_settings (id, is_enabled, welcome_message, tone, restrict_to_relevant_topics)
            VALUES (1, $1, $2, $3, $4)
            ON CONFLICT(id) DO UPDATE SET
                is_enabled = excluded.is_enabled,
                welcome_message = excluded.welcome_message,
                tone = excluded.tone,
                restrict_to_relevant_topics = excluded.restrict_to_relevant_topics,
                updated_at = datetime('now', 'subsec')
            RETURNING is_enabled, welcome_message, tone, restrict_to_relevant_topics, updated_at"#,
        )
        .bind(is_enabled)
        .bind(welcome_message)
        .bind(tone)
        .bind(restrict)
        .fetch_one(pool)
        .await
    }
}
