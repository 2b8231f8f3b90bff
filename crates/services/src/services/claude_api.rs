//! Claude API client backing the chat assistant.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::response_generator::{GenerationError, GenerationRequest, ResponseGenerator, Role};

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REPLY_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Error)]
pub enum ClaudeApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
}

impl From<ClaudeApiError> for GenerationError {
    fn from(e: ClaudeApiError) -> Self {
        match e {
            ClaudeApiError::Timeout => GenerationError::Timeout,
            other => GenerationError::Failed(other.to_string()),
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for Claude API
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

/// Content block in response
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

/// Response from Claude API
#[derive(Debug, Deserialize)]
pub struct ClaudeResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

impl ClaudeResponse {
    /// All text blocks joined in order
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(""))
        }
    }
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Claude API client
#[derive(Debug)]
pub struct ClaudeApiClient {
    http: Client,
    api_key: SecretString,
    model: String,
}

impl ClaudeApiClient {
    /// Create a new client with the given API key. `timeout` bounds the whole request.
    pub fn new(
        api_key: String,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClaudeApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("atelier-site/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClaudeApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: SecretString::from(api_key),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// Send a single completion request to Claude
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        max_tokens: u32,
    ) -> Result<ClaudeResponse, ClaudeApiError> {
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens,
            messages,
            system,
        };
        self.send_request(&request).await
    }

    async fn send_request(&self, request: &ClaudeRequest) -> Result<ClaudeResponse, ClaudeApiError> {
        let res = self
            .http
            .post(CLAUDE_API_URL)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<ClaudeResponse>()
                .await
                .map_err(map_reqwest_error),
            StatusCode::UNAUTHORIZED => Err(ClaudeApiError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(ClaudeApiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(ClaudeApiError::Http { status, body })
            }
        }
    }
}

#[async_trait]
impl ResponseGenerator for ClaudeApiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let messages = request
            .conversation()
            .into_iter()
            .map(|turn| match turn.role {
                Role::User => Message::user(turn.content),
                Role::Assistant => Message::assistant(turn.content),
            })
            .collect();

        let response = self
            .complete(messages, Some(request.system_prompt()), REPLY_MAX_TOKENS)
            .await?;

        debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Claude reply received"
        );

        response
            .text()
            .ok_or_else(|| ClaudeApiError::Serde("No text content in response".to_string()).into())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ClaudeApiError {
    if e.is_timeout() {
        ClaudeApiError::Timeout
    } else if e.is_decode() {
        ClaudeApiError::Serde(e.to_string())
    } else {
        ClaudeApiError::Transport(e.to_string())
    }
}
