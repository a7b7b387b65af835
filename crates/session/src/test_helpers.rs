//! Scripted backend and recording view shared by the session tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use tutor_core::error::{ProviderError, SessionError, TurnError};
use tutor_core::message::{HistoryEntry, MessageContent, MessageId};
use tutor_core::provider::{
    Backend, ConversationHandle, FragmentReceiver, GenerationConfig, StreamChunk,
};
use tutor_core::session::{Grade, SessionConfig, TutorMode};

use crate::consumer::TutorView;

pub fn test_config(mode: TutorMode) -> SessionConfig {
    SessionConfig::new(Grade::new(10).unwrap(), "Science", "Light", mode).unwrap()
}

/// What the next `send_message_stream` call does.
#[derive(Debug, Clone)]
pub enum TurnScript {
    Fragments(Vec<String>),
    FailAfter(Vec<String>, ProviderError),
    Reject(ProviderError),
}

impl TurnScript {
    pub fn fragments<const N: usize>(parts: [&str; N]) -> Self {
        Self::Fragments(parts.iter().map(|s| s.to_string()).collect())
    }
}

#[derive(Debug, Clone)]
pub struct CreatedConversation {
    pub model: String,
    pub config: GenerationConfig,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub model: String,
    pub text: String,
    pub has_image: bool,
}

#[derive(Default)]
struct Shared {
    scripts: VecDeque<TurnScript>,
    created: Vec<CreatedConversation>,
    sent: Vec<SentMessage>,
    fail_create: Option<ProviderError>,
    fail_history: bool,
}

/// In-memory backend whose replies are queued up front.
///
/// Unscripted turns reply with a single "ok" fragment.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_script(&self, script: TurnScript) {
        self.shared.lock().unwrap().scripts.push_back(script);
    }

    /// Fail the next conversation creation with `error`.
    pub fn fail_create(&self, error: ProviderError) {
        self.shared.lock().unwrap().fail_create = Some(error);
    }

    pub fn fail_history(&self, fail: bool) {
        self.shared.lock().unwrap().fail_history = fail;
    }

    pub fn created(&self) -> Vec<CreatedConversation> {
        self.shared.lock().unwrap().created.clone()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.shared.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn create_conversation(
        &self,
        model: &str,
        config: GenerationConfig,
        history: Vec<HistoryEntry>,
    ) -> Result<Box<dyn ConversationHandle>, ProviderError> {
        let mut shared = self.shared.lock().unwrap();
        if let Some(e) = shared.fail_create.take() {
            return Err(e);
        }
        shared.created.push(CreatedConversation {
            model: model.to_string(),
            config,
            history: history.clone(),
        });
        Ok(Box::new(ScriptedConversation {
            model: model.to_string(),
            history: Mutex::new(history),
            shared: self.shared.clone(),
        }))
    }
}

struct ScriptedConversation {
    model: String,
    history: Mutex<Vec<HistoryEntry>>,
    shared: Arc<Mutex<Shared>>,
}

#[async_trait]
impl ConversationHandle for ScriptedConversation {
    fn model(&self) -> &str {
        &self.model
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, ProviderError> {
        if self.shared.lock().unwrap().fail_history {
            return Err(ProviderError::Network("history unavailable".into()));
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn send_message_stream(
        &self,
        content: MessageContent,
    ) -> Result<FragmentReceiver, ProviderError> {
        let script = {
            let mut shared = self.shared.lock().unwrap();
            let entry = HistoryEntry::user(content.clone());
            shared.sent.push(SentMessage {
                model: self.model.clone(),
                text: entry.text(),
                has_image: content.has_image(),
            });
            shared
                .scripts
                .pop_front()
                .unwrap_or_else(|| TurnScript::fragments(["ok"]))
        };

        let (fragments, failure) = match script {
            TurnScript::Reject(e) => return Err(e),
            TurnScript::Fragments(f) => (f, None),
            TurnScript::FailAfter(f, e) => (f, Some(e)),
        };

        let (tx, rx) = mpsc::channel(fragments.len() + 2);
        for fragment in &fragments {
            tx.try_send(Ok(StreamChunk::text(fragment.clone()))).unwrap();
        }
        match failure {
            Some(e) => tx.try_send(Err(e)).unwrap(),
            None => {
                let mut history = self.history.lock().unwrap();
                history.push(HistoryEntry::user(content));
                history.push(HistoryEntry::model(fragments.concat()));
                tx.try_send(Ok(StreamChunk::done())).unwrap();
            }
        }
        Ok(rx)
    }
}

/// A view that records every callback.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub fragments: Vec<(MessageId, String)>,
    pub turn_errors: Vec<(MessageId, TurnError)>,
    pub session_errors: Vec<String>,
}

impl RecordingView {
    pub fn snapshots(&self) -> Vec<String> {
        self.fragments.iter().map(|(_, s)| s.clone()).collect()
    }
}

impl TutorView for RecordingView {
    fn on_fragment(&mut self, id: MessageId, snapshot: &str) {
        self.fragments.push((id, snapshot.to_string()));
    }

    fn on_turn_error(&mut self, id: MessageId, error: &TurnError) {
        self.turn_errors.push((id, error.clone()));
    }

    fn on_session_error(&mut self, error: &SessionError) {
        self.session_errors.push(error.to_string());
    }
}
