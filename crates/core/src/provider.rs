//! Backend traits: the abstraction over the remote LLM service.
//!
//! A [`Backend`] opens conversations. A [`ConversationHandle`] is bound to one
//! (model, generation config, system instruction) triple for its whole life:
//! changing any of them means creating a new handle seeded with the old one's
//! history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{HistoryEntry, MessageContent};

/// Generation settings fixed at conversation creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Full system instruction text
    pub system_instruction: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Extended-reasoning budget in tokens, if reasoning is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_budget: Option<u32>,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial text delta
    #[serde(default)]
    pub text: Option<String>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            done: false,
        }
    }

    pub fn done() -> Self {
        Self {
            text: None,
            done: true,
        }
    }
}

/// Receiving end of a streamed response.
pub type FragmentReceiver =
    tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>;

/// The remote LLM service.
#[async_trait]
pub trait Backend: Send + Sync {
    /// A human-readable name for this backend (e.g., "gemini").
    fn name(&self) -> &str;

    /// Open a conversation bound to `model` and `config`, optionally seeded
    /// with prior history.
    async fn create_conversation(
        &self,
        model: &str,
        config: GenerationConfig,
        history: Vec<HistoryEntry>,
    ) -> std::result::Result<Box<dyn ConversationHandle>, ProviderError>;

    /// List available models.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }

    /// Whether the backend is reachable.
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

/// A live backend conversation.
#[async_trait]
pub trait ConversationHandle: Send + Sync {
    /// The model this conversation is bound to.
    fn model(&self) -> &str;

    /// Ordered history of completed turns.
    async fn history(&self) -> std::result::Result<Vec<HistoryEntry>, ProviderError>;

    /// Send one user turn and stream the response.
    ///
    /// Errors returned directly mean the request never started. Errors sent
    /// through the receiver happened mid-stream.
    async fn send_message_stream(
        &self,
        content: MessageContent,
    ) -> std::result::Result<FragmentReceiver, ProviderError>;
}
