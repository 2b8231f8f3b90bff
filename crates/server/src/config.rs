use std::{path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use secrecy::SecretString;
use services::services::object_storage::StorageConfig;

const DEFAULT_DATABASE_URL: &str = "sqlite:data/site.db?mode=rwc";
const DEFAULT_BUCKET: &str = "gallery-images";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
    pub anthropic_api_key: Option<SecretString>,
    pub claude_model: Option<String>,
    pub generation_timeout: Duration,
    pub admin_token_secret: SecretString,
    pub bootstrap_admin: Option<(String, SecretString)>,
    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid PORT: {p}"))?,
            None => 3001,
        };
        let generation_timeout = match get("GENERATION_TIMEOUT_SECS") {
            Some(s) => Duration::from_secs(
                s.parse()
                    .with_context(|| format!("invalid GENERATION_TIMEOUT_SECS: {s}"))?,
            ),
            None => Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        };

        let Some(admin_token_secret) = get("ADMIN_TOKEN_SECRET") else {
            bail!("ADMIN_TOKEN_SECRET must be set");
        };

        let bootstrap_admin = match (get("ADMIN_USERNAME"), get("ADMIN_PASSWORD")) {
            (Some(user), Some(password)) => Some((user, SecretString::from(password))),
            _ => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            storage: StorageConfig {
                supabase_url: get("SUPABASE_URL"),
                supabase_service_key: get("SUPABASE_SERVICE_KEY").map(SecretString::from),
                bucket: get("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
                upload_dir: PathBuf::from(
                    get("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
                ),
            },
            anthropic_api_key: get("ANTHROPIC_API_KEY").map(SecretString::from),
            claude_model: get("CLAUDE_MODEL"),
            generation_timeout,
            admin_token_secret: SecretString::from(admin_token_secret),
            bootstrap_admin,
            sentry_dsn: get("SENTRY_DSN"),
        })
    }
}
