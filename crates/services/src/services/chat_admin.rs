//! Assistant configuration: the settings singleton and the knowledge base.
//! Everything except the public settings view requires an [`AdminIdentity`].

use db::models::{
    chat_settings::{ChatSettings, PublicChatSettings, UpdateChatSettings},
    knowledge_base::{CreateKnowledgeBaseEntry, KnowledgeBaseEntry, UpdateKnowledgeBaseEntry},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::admin_auth::AdminIdentity;

#[derive(Debug, Error)]
pub enum ChatAdminError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("knowledge base entry {0} not found")]
    EntryNotFound(Uuid),
    #[error("{0}")]
    Validation(String),
}

#[derive(Clone)]
pub struct ChatAdmin {
    pool: SqlitePool,
}

impl ChatAdmin {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn public_settings(&self) -> Result<PublicChatSettings, ChatAdminError> {
        Ok(ChatSettings::find_or_default(&self.pool).await?.into())
    }

    pub async fn settings(&self, _admin: &AdminIdentity) -> Result<ChatSettings, ChatAdminError> {
        Ok(ChatSettings::find_or_default(&self.pool).await?)
    }

    pub async fn update_settings(
        &self,
        admin: &AdminIdentity,
        update: UpdateChatSettings,
    ) -> Result<ChatSettings, ChatAdminError> {
        if update
            .welcome_message
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            return Err(ChatAdminError::Validation(
                "welcomeMessage must not be empty".to_string(),
            ));
        }
        let settings = ChatSettings::upsert(&self.pool, &update).await?;
        info!(
            admin = %admin.username,
            is_enabled = settings.is_enabled,
            tone = %settings.tone,
            "Chat settings updated"
        );
        Ok(settings)
    }

    pub async fn list_entries(
        &self,
        _admin: &AdminIdentity,
    ) -> Result<Vec<KnowledgeBaseEntry>, ChatAdminError> {
        Ok(KnowledgeBaseEntry::find_all(&self.pool).await?)
    }

    pub async fn get_entry(
        &self,
        _admin: &AdminIdentity,
        id: Uuid,
    ) -> Result<KnowledgeBaseEntry, ChatAdminError> {
        KnowledgeBaseEntry::find_by_id(&self.pool, id)
            .await?
            .ok_or(ChatAdminError::EntryNotFound(id))
    }

    pub async fn create_entry(
        &self,
        admin: &AdminIdentity,
        data: CreateKnowledgeBaseEntry,
    ) -> Result<KnowledgeBaseEntry, ChatAdminError> {
        for (field, value) in [
            ("title", &data.title),
            ("content", &data.content),
            ("category", &data.category),
        ] {
            if value.trim().is_empty() {
                return Err(ChatAdminError::Validation(format!("{field} is required")));
            }
        }
        let entry = KnowledgeBaseEntry::create(&self.pool, &data, Uuid::new_v4()).await?;
        info!(admin = %admin.username, entry_id = %entry.id, "Knowledge base entry created");
        Ok(entry)
    }

    pub async fn update_entry(
        &self,
        admin: &AdminIdentity,
        id: Uuid,
        data: UpdateKnowledgeBaseEntry,
    ) -> Result<KnowledgeBaseEntry, ChatAdminError> {
        let entry = KnowledgeBaseEntry::update(&self.pool, id, &data)
            .await?
            .ok_or(ChatAdminError::EntryNotFound(id))?;
        info!(admin = %admin.username, entry_id = %id, "Knowledge base entry updated");
        Ok(entry)
    }

    pub async fn delete_entry(&self, admin: &AdminIdentity, id: Uuid) -> Result<(), ChatAdminError> {
        if KnowledgeBaseEntry::delete(&self.pool, id).await? == 0 {
            return Err(ChatAdminError::EntryNotFound(id));
        }
        info!(admin = %admin.username, entry_id = %id, "Knowledge base entry deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use db::{DBService, models::chat_settings::ChatTone};

    use super::*;

    async fn admin_service() -> (ChatAdmin, AdminIdentity) {
        let db = DBService::new_in_memory().await.unwrap();
        (ChatAdmin::new(db.pool), AdminIdentity::for_tests("studio"))
    }

    #[tokio::test]
    async fn public_settings_fall_back_to_defaults() {
        let (chat_admin, _) = admin_service().await;
        let settings = chat_admin.public_settings().await.unwrap();
        assert!(settings.is_enabled);
        assert_eq!(settings.tone, ChatTone::Professional);
        assert!(!settings.welcome_message.is_empty());
    }

    #[tokio::test]
    async fn settings_update_is_visible_publicly() {
        let (chat_admin, admin) = admin_service().await;
        chat_admin
            .update_settings(
                &admin,
                UpdateChatSettings {
                    tone: Some(ChatTone::Friendly),
                    restrict_to_relevant_topics: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            chat_admin.public_settings().await.unwrap().tone,
            ChatTone::Friendly
        );
        assert!(!chat_admin.settings(&admin).await.unwrap().restrict_to_relevant_topics);

        let err = chat_admin
            .update_settings(
                &admin,
                UpdateChatSettings {
                    welcome_message: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChatAdminError::Validation(_)));
    }

    #[tokio::test]
    async fn knowledge_base_crud() {
        let (chat_admin, admin) = admin_service().await;
        let entry = chat_admin
            .create_entry(
                &admin,
                CreateKnowledgeBaseEntry {
                    title: "Opening hours".to_string(),
                    content: "Mon-Fri 9-18".to_string(),
                    category: "studio".to_string(),
                    is_active: true,
                },
            )
            .await
            .unwrap();

        let updated = chat_admin
            .update_entry(
                &admin,
                entry.id,
                UpdateKnowledgeBaseEntry {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.title, "Opening hours");

        assert_eq!(chat_admin.list_entries(&admin).await.unwrap().len(), 1);
        chat_admin.delete_entry(&admin, entry.id).await.unwrap();
        assert!(matches!(
            chat_admin.get_entry(&admin, entry.id).await,
            Err(ChatAdminError::EntryNotFound(_))
        ));
        assert!(matches!(
            chat_admin.delete_entry(&admin, entry.id).await,
            Err(ChatAdminError::EntryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn blank_entry_fields_are_rejected() {
        let (chat_admin, admin) = admin_service().await;
        let err = chat_admin
            .create_entry(
                &admin,
                CreateKnowledgeBaseEntry {
                    title: "".to_string(),
                    content: "x".to_string(),
                    category: "studio".to_string(),
                    is_active: true,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChatAdminError::Validation(m) if m == "title is required"));
    }
}
