//! Conversation content and chat log types.
//!
//! Two different things are called "messages" in this client:
//!
//! - [`HistoryEntry`] / [`MessageContent`]: what the backend sees. Ordered turns of
//!   `user` / `model` content made of text and inline image parts.
//! - [`ChatMessage`] / [`ChatLog`]: what the student sees. Bubbles with a sender,
//!   a timestamp and text that grows while a response streams in.
//!
//! The session controller never reads the chat log; it only emits fragments
//! tagged by [`MessageId`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback mime type when an attachment has no `data:` prefix.
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// The role of a history entry as the backend understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Model,
}

/// Base64 image bytes with their mime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub data: String,
    pub mime_type: String,
}

impl InlineImage {
    /// Split a `data:<mime>;base64,<payload>` URI into mime type and payload.
    ///
    /// Input without the `;base64,` marker is treated as a bare base64 payload
    /// and tagged `image/jpeg`.
    pub fn from_data_uri(uri: &str) -> Self {
        match uri.split_once(";base64,") {
            Some((prefix, data)) => {
                let mime = prefix.strip_prefix("data:").unwrap_or(prefix);
                Self {
                    data: data.to_string(),
                    mime_type: mime.to_string(),
                }
            }
            None => Self {
                data: uri.to_string(),
                mime_type: DEFAULT_IMAGE_MIME.into(),
            },
        }
    }
}

/// One piece of a multi-part message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineImage,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(image: InlineImage) -> Self {
        Self::InlineData { inline_data: image }
    }
}

/// Outgoing content for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<Part>),
}

impl MessageContent {
    /// Plain text when there is no image, otherwise `[text, inline image]`.
    /// An image sent without text carries no text part.
    pub fn compose(text: &str, image: Option<&str>) -> Self {
        match image {
            None => Self::Text(text.to_string()),
            Some(uri) => {
                let mut parts = Vec::with_capacity(2);
                if !text.is_empty() {
                    parts.push(Part::text(text));
                }
                parts.push(Part::image(InlineImage::from_data_uri(uri)));
                Self::Parts(parts)
            }
        }
    }

    /// Flatten to parts, the shape history entries use.
    pub fn into_parts(self) -> Vec<Part> {
        match self {
            Self::Text(text) => vec![Part::text(text)],
            Self::Parts(parts) => parts,
        }
    }

    pub fn has_image(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::Parts(parts) => parts.iter().any(|p| matches!(p, Part::InlineData { .. })),
        }
    }
}

/// One turn of backend-visible conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub parts: Vec<Part>,
}

impl HistoryEntry {
    pub fn user(content: MessageContent) -> Self {
        Self {
            role: HistoryRole::User,
            parts: content.into_parts(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Model,
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect()
    }
}

// --- Chat log (presentation side) ---

/// Identifier of a chat bubble. Monotonic within one [`ChatLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a chat bubble belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
    System,
}

/// A single bubble in the chat log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    /// Grows while streaming, frozen afterwards.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Attached image as a `data:` URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Ordered chat bubbles for one session.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    next_id: u64,
    streaming: Option<MessageId>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, sender: Sender, text: String, image: Option<String>) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            sender,
            text,
            timestamp: Utc::now(),
            image,
        });
        id
    }

    pub fn push_user(&mut self, text: impl Into<String>, image: Option<String>) -> MessageId {
        self.push(Sender::User, text.into(), image)
    }

    pub fn push_system(&mut self, text: impl Into<String>) -> MessageId {
        self.push(Sender::System, text.into(), None)
    }

    /// Open an empty AI bubble that streaming fragments will fill.
    ///
    /// Any previous in-flight bubble is frozen first.
    pub fn begin_ai(&mut self) -> MessageId {
        let id = self.push(Sender::Ai, String::new(), None);
        self.streaming = Some(id);
        id
    }

    /// Replace the text of the in-flight AI bubble with a longer snapshot.
    ///
    /// Returns `false` and leaves the log untouched when `id` is not the
    /// in-flight bubble or the snapshot would shrink its text.
    pub fn update(&mut self, id: MessageId, text: &str) -> bool {
        if self.streaming != Some(id) {
            return false;
        }
        match self.messages.iter_mut().rev().find(|m| m.id == id) {
            Some(msg) if text.len() >= msg.text.len() => {
                msg.text = text.to_string();
                true
            }
            _ => false,
        }
    }

    /// Freeze the in-flight bubble.
    pub fn finish(&mut self, id: MessageId) {
        if self.streaming == Some(id) {
            self.streaming = None;
        }
    }

    /// Drop a bubble (used for AI bubbles that never received text).
    pub fn remove(&mut self, id: MessageId) {
        self.messages.retain(|m| m.id != id);
        if self.streaming == Some(id) {
            self.streaming = None;
        }
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn in_flight(&self) -> Option<MessageId> {
        self.streaming
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
