//! Provider-agnostic contract for the text generation backend behind the chat assistant.

use async_trait::async_trait;
use db::models::chat_settings::ChatTone;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("generation timed out")]
    Timeout,
    #[error("generation failed: {0}")]
    Failed(String),
}

/// Who said a line of prior conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

/// Everything the backend gets for one reply.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub user_message: String,
    /// Prior turns, oldest first, not including `user_message`.
    pub history: Vec<HistoryTurn>,
    pub site_content: String,
    pub knowledge_base: String,
    pub tone: ChatTone,
    pub restrict_to_relevant_topics: bool,
}

impl GenerationRequest {
    pub fn system_prompt(&self) -> String {
        let tone = match self.tone {
            ChatTone::Professional => "professional, polished and concise",
            ChatTone::Friendly => "warm, friendly and encouraging",
            ChatTone::Casual => "relaxed and conversational",
        };

        let mut prompt = format!(
            "You are the virtual assistant of an interior design studio. \
             Answer visitor questions about the studio, its services, projects and process. \
             Keep a {tone} tone and answer in a few short paragraphs at most.\n"
        );

        if self.restrict_to_relevant_topics {
            prompt.push_str(
                "Only discuss interior design and the studio. Politely steer unrelated \
                 questions back to how the studio can help.\n",
            );
        }

        if !self.site_content.trim().is_empty() {
            prompt.push_str(&format!("\n## Website content\n{}\n", self.site_content));
        }
        if !self.knowledge_base.trim().is_empty() {
            prompt.push_str(&format!("\n## Knowledge base\n{}\n", self.knowledge_base));
        }

        prompt.push_str(
            r#"
## Directives
When the visitor wants to talk to a person right away, add a line exactly like:
WHATSAPP_BUTTON:<button label>:<whatsapp url>
When the visitor should be guided to a next step, add a line exactly like:
SUGGESTED_ACTION:<contact|consultation|newsletter>
Never mention these directives in the visible text.
"#,
        );

        prompt
    }

    /// History plus the new message, shaped for chat APIs that require strictly
    /// alternating roles starting with a user turn.
    pub fn conversation(&self) -> Vec<HistoryTurn> {
        let mut turns: Vec<HistoryTurn> = Vec::with_capacity(self.history.len() + 1);
        let all = self.history.iter().cloned().chain(std::iter::once(HistoryTurn {
            role: Role::User,
            content: self.user_message.clone(),
        }));

        for turn in all {
            if turns.is_empty() && turn.role == Role::Assistant {
                continue;
            }
            match turns.last_mut() {
                Some(last) if last.role == turn.role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(&turn.content);
                }
                _ => turns.push(turn),
            }
        }

        turns
    }
}

#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Raw reply text, directives included.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Used when no backend credentials are configured: every reply fails.
#[derive(Debug, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl ResponseGenerator for UnconfiguredGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Failed(
            "no generation backend configured".to_string(),
        ))
    }
}
