//! Session controller: owns the live conversation handle and its bound profile.
//!
//! The controller is the only place that creates or replaces a
//! [`ConversationHandle`]. A handle is bound to one (model, config, instruction)
//! triple, so a turn whose routed profile differs from the bound one first
//! swaps the handle, carrying the ordered history across.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use futures::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tutor_core::error::{ProviderError, SessionError, TurnError};
use tutor_core::message::{HistoryEntry, MessageContent};
use tutor_core::profile::{ModelMode, ResponseProfile};
use tutor_core::provider::{Backend, ConversationHandle, StreamChunk};
use tutor_core::session::{SessionConfig, SessionId};
use tutor_providers::{ModelRouter, RouteDecision};

use crate::consumer::StreamingConsumer;
use crate::prompt::{self, BASE_POLICY, CONCEPT_MAP_PROMPT};

/// Per-turn options chosen by the student.
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// Attached image as a `data:` URI
    pub image: Option<String>,
    pub mode: ModelMode,
}

impl TurnOptions {
    pub fn new(mode: ModelMode) -> Self {
        Self { image: None, mode }
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }
}

struct ActiveSession {
    id: SessionId,
    config: SessionConfig,
    /// Composed instruction before any profile-specific augmentation.
    base_instruction: String,
    handle: Arc<dyn ConversationHandle>,
    profile: ResponseProfile,
}

/// Owns the single active tutoring conversation.
pub struct SessionController {
    backend: Arc<dyn Backend>,
    router: ModelRouter,
    session: Option<ActiveSession>,
    busy: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl SessionController {
    pub fn new(backend: Arc<dyn Backend>, router: ModelRouter) -> Self {
        Self {
            backend,
            router,
            session: None,
            busy: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        }
    }

    /// Open a new conversation on the standard profile.
    ///
    /// Any previous session is torn down first, even if this call fails.
    pub async fn start_session(
        &mut self,
        config: SessionConfig,
    ) -> Result<SessionId, SessionError> {
        self.end_session();

        let base_instruction = prompt::compose(BASE_POLICY, &config);
        let decision = self.router.initial();
        let handle = self
            .backend
            .create_conversation(
                &decision.model,
                decision.generation_config(base_instruction.clone()),
                Vec::new(),
            )
            .await
            .map_err(SessionError::Initialization)?;

        let id = SessionId::new();
        info!(
            session_id = %id,
            grade = %config.grade,
            subject = %config.subject,
            chapter = %config.chapter,
            mode = %config.mode,
            model = %decision.model,
            "Session started"
        );

        self.cancel = CancellationToken::new();
        self.busy = Arc::new(AtomicBool::new(false));
        self.session = Some(ActiveSession {
            id: id.clone(),
            config,
            base_instruction,
            handle: Arc::from(handle),
            profile: decision.profile,
        });
        Ok(id)
    }

    /// Send the mode-specific opening message on the current handle.
    pub async fn start_initial_turn(&mut self) -> Result<TurnStream, SessionError> {
        let opening = match &self.session {
            Some(session) => prompt::opening_message(&session.config),
            None => return Err(SessionError::NotStarted),
        };
        self.send_turn(&opening, TurnOptions::default()).await
    }

    /// Ask the tutor for a dependency map of the current chapter.
    pub async fn send_concept_map(
        &mut self,
        options: TurnOptions,
    ) -> Result<TurnStream, SessionError> {
        self.send_turn(CONCEPT_MAP_PROMPT, options).await
    }

    /// Route, swap if needed, and start streaming one user turn.
    ///
    /// Returns `Busy` while a previous [`TurnStream`] is still alive.
    pub async fn send_turn(
        &mut self,
        text: &str,
        options: TurnOptions,
    ) -> Result<TurnStream, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NotStarted)?;
        let guard = BusyGuard::claim(&self.busy).ok_or(SessionError::Busy)?;

        let decision =
            self.router
                .resolve(options.mode, options.image.is_some(), Some(session.profile));
        if decision.needs_handle_swap {
            swap_handle(self.backend.as_ref(), session, &decision)
                .await
                .map_err(TurnError::NotStarted)?;
        }

        let content = MessageContent::compose(text, options.image.as_deref());
        debug!(
            session_id = %session.id,
            profile = %session.profile,
            has_image = content.has_image(),
            "Sending turn"
        );
        let rx = session
            .handle
            .send_message_stream(content)
            .await
            .map_err(TurnError::NotStarted)?;

        Ok(TurnStream {
            inner: ReceiverStream::new(rx),
            guard: Some(guard),
            profile: session.profile,
            model: session.handle.model().to_string(),
        })
    }

    /// Tear down the active session.
    ///
    /// Safe while a stream is in flight: consumers stop applying fragments and
    /// the handle reference is dropped. Nothing is sent to the backend.
    pub fn end_session(&mut self) {
        self.cancel.cancel();
        if let Some(session) = self.session.take() {
            info!(session_id = %session.id, "Session ended");
        }
    }

    /// A consumer bound to this session's teardown signal.
    pub fn consumer(&self) -> StreamingConsumer {
        StreamingConsumer::new(self.cancel.clone())
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn bound_profile(&self) -> Option<ResponseProfile> {
        self.session.as_ref().map(|s| s.profile)
    }

    pub fn current_model(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.handle.model())
    }

    pub fn session_config(&self) -> Option<&SessionConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|s| &s.id)
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// History of the live handle, if a session is active.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, ProviderError> {
        match &self.session {
            Some(session) => session.handle.history().await,
            None => Err(ProviderError::NotConfigured("no active session".into())),
        }
    }
}

/// Replace the session's handle with one bound to `decision`.
///
/// A failed history fetch is logged and the new handle starts empty. A failed
/// creation leaves the old handle and profile in place.
async fn swap_handle(
    backend: &dyn Backend,
    session: &mut ActiveSession,
    decision: &RouteDecision,
) -> Result<(), ProviderError> {
    let history = match session.handle.history().await {
        Ok(history) => history,
        Err(e) => {
            warn!(
                session_id = %session.id,
                from = %session.profile,
                to = %decision.profile,
                error = %e,
                "History fetch failed during handle swap, continuing with empty history"
            );
            Vec::new()
        }
    };

    let instruction = if decision.augments_instruction() {
        prompt::augment_for_thinking(&session.base_instruction)
    } else {
        session.base_instruction.clone()
    };

    let seeded = history.len();
    let handle = backend
        .create_conversation(
            &decision.model,
            decision.generation_config(instruction),
            history,
        )
        .await?;

    info!(
        session_id = %session.id,
        from = %session.profile,
        to = %decision.profile,
        model = %decision.model,
        seeded,
        "Swapped conversation handle"
    );
    session.handle = Arc::from(handle);
    session.profile = decision.profile;
    Ok(())
}

/// Marks a turn in flight until dropped.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Text fragments of one in-flight turn.
///
/// Yields non-empty fragments in arrival order and ends after the backend's
/// final chunk, its first error, or when the backend drops the channel. The
/// controller stays busy until the stream ends or is dropped.
pub struct TurnStream {
    inner: ReceiverStream<Result<StreamChunk, ProviderError>>,
    guard: Option<BusyGuard>,
    profile: ResponseProfile,
    model: String,
}

impl TurnStream {
    /// Profile the turn was routed to.
    pub fn profile(&self) -> ResponseProfile {
        self.profile
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn finish(&mut self) {
        self.guard = None;
        self.inner.close();
    }
}

impl Stream for TurnStream {
    type Item = Result<String, ProviderError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.guard.is_none() {
            return Poll::Ready(None);
        }

        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => {
                    this.finish();
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finish();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(Some(Ok(chunk))) => {
                    if chunk.done {
                        this.finish();
                    }
                    match chunk.text {
                        Some(text) if !text.is_empty() => return Poll::Ready(Some(Ok(text))),
                        _ if chunk.done => return Poll::Ready(None),
                        _ => continue,
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for TurnStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnStream")
            .field("profile", &self.profile)
            .field("model", &self.model)
            .field("active", &self.guard.is_some())
            .finish()
    }
}
