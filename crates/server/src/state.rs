use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use db::DBService;
use secrecy::{ExposeSecret, SecretString};
use services::services::{
    admin_auth::AdminAuthService,
    chat_admin::ChatAdmin,
    chat_assistant::ChatAssistant,
    claude_api::ClaudeApiClient,
    image_ingestion::ImageIngestionService,
    object_storage::StorageBackend,
    response_generator::{ResponseGenerator, UnconfiguredGenerator},
};
use tracing::{info, warn};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub chat: ChatAssistant,
    pub chat_admin: ChatAdmin,
    pub images: ImageIngestionService,
    pub auth: AdminAuthService,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(
        db: DBService,
        generator: Arc<dyn ResponseGenerator>,
        storage: StorageBackend,
        upload_dir: PathBuf,
        token_secret: SecretString,
    ) -> Self {
        let pool = db.pool;
        Self {
            chat: ChatAssistant::new(pool.clone(), generator),
            chat_admin: ChatAdmin::new(pool.clone()),
            images: ImageIngestionService::new(pool.clone(), storage),
            auth: AdminAuthService::new(pool, token_secret),
            upload_dir,
        }
    }

    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        ensure_database_dir(&config.database_url)?;
        let db = DBService::new(&config.database_url)
            .await
            .context("opening content store")?;

        let generator: Arc<dyn ResponseGenerator> = match &config.anthropic_api_key {
            Some(key) => Arc::new(ClaudeApiClient::new(
                key.expose_secret().to_string(),
                config.claude_model.clone(),
                config.generation_timeout,
            )?),
            None => {
                warn!("ANTHROPIC_API_KEY not set, chat replies will fail");
                Arc::new(UnconfiguredGenerator)
            }
        };

        let storage = StorageBackend::from_config(&config.storage)?;

        let state = Self::new(
            db,
            generator,
            storage,
            config.storage.upload_dir.clone(),
            config.admin_token_secret.clone(),
        );

        if let Some((username, password)) = &config.bootstrap_admin {
            state
                .auth
                .ensure_admin(username, password.expose_secret())
                .await?;
        }

        info!("Application state ready");
        Ok(state)
    }
}

/// Creates the directory holding a file-backed SQLite database.
fn ensure_database_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = rest.trim_start_matches("//");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}
