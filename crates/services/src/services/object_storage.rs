//! Where processed image bytes live: a cloud object store when one is
//! configured, otherwise a directory served by this process.

use std::{
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Transport(String),
    #[error("storage returned http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A remote bucket addressed by slash-separated object paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError>;

    fn public_url(&self, path: &str) -> String;

    /// Inverse of [`ObjectStore::public_url`]; `None` for URLs this store did not issue.
    fn path_from_url(&self, url: &str) -> Option<String>;
}

/// Supabase Storage over its REST API.
#[derive(Debug)]
pub struct SupabaseStorage {
    http: Client,
    base_url: String,
    service_key: SecretString,
    bucket: String,
}

impl SupabaseStorage {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(
        base_url: &str,
        service_key: SecretString,
        bucket: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("atelier-site/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket: bucket.into(),
        })
    }

    fn object_endpoint(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    fn public_prefix(&self) -> String {
        format!("{}/storage/v1/object/public/{}/", self.base_url, self.bucket)
    }

    async fn check(res: reqwest::Response) -> Result<(), StorageError> {
        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(StorageError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        let key = self.service_key.expose_secret();
        let res = self
            .http
            .post(self.object_endpoint(path))
            .bearer_auth(key)
            .header("apikey", key)
            .header("content-type", content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        Self::check(res).await?;
        debug!(bucket = %self.bucket, path = %path, "Stored object");
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        let key = self.service_key.expose_secret();
        let res = self
            .http
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .bearer_auth(key)
            .header("apikey", key)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        Self::check(res).await
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{}", self.public_prefix(), path)
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_prefix())
            .filter(|p| !p.is_empty())
            .map(|p| p.split(['?', '#']).next().unwrap_or(p).to_string())
    }
}

/// Local directory fallback, served under `url_prefix`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Writes `relative` under the root, creating directories as needed.
    pub async fn write(&self, relative: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.root.join(relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        debug!(path = %target.display(), "Wrote local object");
        Ok(())
    }

    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative)
    }
}

/// The storage backend chosen once at startup.
#[derive(Clone)]
pub enum StorageBackend {
    Cloud(Arc<dyn ObjectStore>),
    Local(LocalStorage),
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<SecretString>,
    pub bucket: String,
    pub upload_dir: PathBuf,
}

impl StorageBackend {
    /// Cloud when both URL and key are present, local directory otherwise.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        match (&config.supabase_url, &config.supabase_service_key) {
            (Some(url), Some(key)) if !url.trim().is_empty() => {
                info!(bucket = %config.bucket, "Using Supabase object storage for uploads");
                let store = SupabaseStorage::new(url, key.clone(), config.bucket.clone())?;
                Ok(StorageBackend::Cloud(Arc::new(store)))
            }
            _ => {
                info!(
                    upload_dir = %config.upload_dir.display(),
                    "Cloud storage not configured, storing uploads locally"
                );
                Ok(StorageBackend::Local(LocalStorage::new(
                    config.upload_dir.clone(),
                    "/uploads",
                )))
            }
        }
    }

    pub fn is_cloud(&self) -> bool {
        matches!(self, StorageBackend::Cloud(_))
    }
}
