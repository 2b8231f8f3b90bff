//! Chat assistant pipeline: persist the visitor's line, ground the backend in
//! site content and knowledge base entries, parse its reply and persist it.

use std::sync::Arc;

use db::models::{
    chat_conversation::{ChatConversation, CreateChatConversation},
    chat_message::{ChatMessage, CreateChatMessage},
    chat_settings::ChatSettings,
    knowledge_base::KnowledgeBaseEntry,
    site_content::SiteContentSection,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    directives::{self, ActionButton, SuggestedAction},
    response_generator::{
        GenerationError, GenerationRequest, HistoryTurn, ResponseGenerator, Role,
    },
};

const EMPTY_REPLY_FALLBACK: &str =
    "Thanks for your message! Our team will follow up with you shortly.";

#[derive(Debug, Error)]
pub enum ChatAssistantError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("conversation {0} not found")]
    ConversationNotFound(Uuid),
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("reply generation failed for conversation {conversation_id}: {source}")]
    Generation {
        conversation_id: Uuid,
        #[source]
        source: GenerationError,
    },
    #[error("failed to save assistant reply for conversation {conversation_id}: {source}")]
    RecordCreation {
        conversation_id: Uuid,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PostChatMessage {
    pub conversation_id: Uuid,
    pub message: String,
    pub is_from_user: bool,
}

/// Assistant reply as returned to the widget.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    #[serde(flatten)]
    pub message: ChatMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_button: Option<ActionButton>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    pub user_message: ChatMessage,
    pub ai_message: AssistantMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<SuggestedAction>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PostMessageOutcome {
    /// Non-visitor line stored verbatim, no reply generated.
    Saved(ChatMessage),
    Replied(ChatExchange),
}

#[derive(Clone)]
pub struct ChatAssistant {
    pool: SqlitePool,
    generator: Arc<dyn ResponseGenerator>,
}

impl ChatAssistant {
    pub fn new(pool: SqlitePool, generator: Arc<dyn ResponseGenerator>) -> Self {
        Self { pool, generator }
    }

    /// Always inserts a new conversation, even for a session that already has one.
    pub async fn start_conversation(
        &self,
        data: CreateChatConversation,
    ) -> Result<ChatConversation, ChatAssistantError> {
        let conversation = ChatConversation::create(&self.pool, &data, Uuid::new_v4()).await?;
        info!(
            conversation_id = %conversation.id,
            session_id = %conversation.session_id,
            "Started chat conversation"
        );
        Ok(conversation)
    }

    pub async fn history(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<ChatMessage>, ChatAssistantError> {
        self.require_conversation(conversation_id).await?;
        Ok(ChatMessage::find_by_conversation_id(&self.pool, conversation_id).await?)
    }

    pub async fn post_message(
        &self,
        payload: PostChatMessage,
    ) -> Result<PostMessageOutcome, ChatAssistantError> {
        if payload.message.trim().is_empty() {
            return Err(ChatAssistantError::EmptyMessage);
        }
        self.require_conversation(payload.conversation_id).await?;

        let saved = ChatMessage::create(
            &self.pool,
            &CreateChatMessage {
                conversation_id: payload.conversation_id,
                message: payload.message.clone(),
                is_from_user: payload.is_from_user,
            },
            Uuid::new_v4(),
        )
        .await?;
        ChatConversation::touch(&self.pool, payload.conversation_id).await?;

        if !payload.is_from_user {
            return Ok(PostMessageOutcome::Saved(saved));
        }

        let request = self.build_request(&saved).await?;
        let raw_reply = self
            .generator
            .generate(&request)
            .await
            .map_err(|source| ChatAssistantError::Generation {
                conversation_id: saved.conversation_id,
                source,
            })?;

        let parsed = directives::parse_reply(&raw_reply);
        let text = if parsed.text.is_empty() {
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            parsed.text
        };

        let ai_message = ChatMessage::create(
            &self.pool,
            &CreateChatMessage {
                conversation_id: saved.conversation_id,
                message: text,
                is_from_user: false,
            },
            Uuid::new_v4(),
        )
        .await
        .map_err(|source| ChatAssistantError::RecordCreation {
            conversation_id: saved.conversation_id,
            source,
        })?;

        info!(
            conversation_id = %saved.conversation_id,
            has_action_button = parsed.action_button.is_some(),
            suggested_action = ?parsed.suggested_action,
            "Chat reply generated"
        );

        Ok(PostMessageOutcome::Replied(ChatExchange {
            user_message: saved,
            ai_message: AssistantMessage {
                message: ai_message,
                action_button: parsed.action_button,
            },
            suggested_action: parsed.suggested_action,
        }))
    }

    async fn require_conversation(&self, id: Uuid) -> Result<ChatConversation, ChatAssistantError> {
        ChatConversation::find_by_id(&self.pool, id)
            .await?
            .ok_or(ChatAssistantError::ConversationNotFound(id))
    }

    /// Settings are re-read on every message so admin edits apply immediately.
    async fn build_request(
        &self,
        current: &ChatMessage,
    ) -> Result<GenerationRequest, ChatAssistantError> {
        let history = ChatMessage::find_by_conversation_id(&self.pool, current.conversation_id)
            .await?
            .into_iter()
            .filter(|m| m.id != current.id)
            .map(|m| HistoryTurn {
                role: if m.is_from_user {
                    Role::User
                } else {
                    Role::Assistant
                },
                content: m.message,
            })
            .collect();

        let settings = ChatSettings::find_or_default(&self.pool).await?;
        let site_content = SiteContentSection::find_all(&self.pool).await?;
        let knowledge = KnowledgeBaseEntry::find_active(&self.pool).await?;

        Ok(GenerationRequest {
            user_message: current.message.clone(),
            history,
            site_content: join_paragraphs(
                site_content
                    .iter()
                    .map(|s| format!("{}: {}", s.section, s.content.trim())),
            ),
            knowledge_base: join_paragraphs(
                knowledge
                    .iter()
                    .map(|k| format!("{} ({}): {}", k.title, k.category, k.content.trim())),
            ),
            tone: settings.tone,
            restrict_to_relevant_topics: settings.restrict_to_relevant_topics,
        })
    }
}

fn join_paragraphs(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join("\n\n")
}
