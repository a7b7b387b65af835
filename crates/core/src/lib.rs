//! # Tutor Core
//!
//! Domain types, traits, and error definitions for the NCERT tutor chat client.
//! This crate does no I/O. It defines the domain model
//! that the backend, session and presentation crates implement against.
//!
//! ## Design Philosophy
//!
//! The LLM backend is defined as a pair of traits here ([`Backend`] and
//! [`ConversationHandle`]). Implementations live in `tutor-providers`, and the
//! session controller only ever sees the traits. This enables:
//! - Swapping the remote provider without touching session logic
//! - Testing the controller against scripted in-memory backends

pub mod attachment;
pub mod error;
pub mod message;
pub mod profile;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use attachment::PendingAttachment;
pub use error::{ProviderError, SessionError, SetupError, TurnError};
pub use message::{
    ChatLog, ChatMessage, HistoryEntry, HistoryRole, InlineImage, MessageContent, MessageId, Part,
    Sender,
};
pub use profile::{ModelMode, ResponseProfile};
pub use provider::{Backend, ConversationHandle, FragmentReceiver, GenerationConfig, StreamChunk};
pub use session::{Grade, SessionConfig, SessionId, TutorMode};
