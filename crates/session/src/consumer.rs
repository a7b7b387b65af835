//! Streaming consumer: turns a fragment stream into growing text snapshots.
//!
//! The consumer keeps one accumulator per turn and hands the view the whole
//! text after every fragment, never a delta. Teardown of the owning session is
//! observed through a [`CancellationToken`]; once it fires, nothing else
//! reaches the view.

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tutor_core::error::{ProviderError, SessionError, TurnError};
use tutor_core::message::MessageId;

/// Presentation-side subscriber of a streamed turn.
pub trait TutorView: Send {
    /// Replace the text of message `id` with `snapshot`.
    fn on_fragment(&mut self, id: MessageId, snapshot: &str);

    /// A turn failed. Partial text (if any) is already on screen.
    fn on_turn_error(&mut self, id: MessageId, error: &TurnError);

    /// The session could not start or open.
    fn on_session_error(&mut self, error: &SessionError);
}

/// Which turn is being consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    /// The tutor's first message after the session starts
    Opening,
    Regular,
}

/// How a consumed turn ended.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Completed { text: String },
    Failed(TurnError),
    /// The session was torn down mid-stream.
    Cancelled { partial: String },
}

impl TurnOutcome {
    /// Text accumulated before the turn ended, however it ended.
    pub fn text(&self) -> &str {
        match self {
            Self::Completed { text } | Self::Cancelled { partial: text } => text.as_str(),
            Self::Failed(e) => e.partial_text().unwrap_or_default(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Applies fragment snapshots to a [`TutorView`].
#[derive(Debug, Clone)]
pub struct StreamingConsumer {
    cancel: CancellationToken,
}

impl StreamingConsumer {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Drive `stream` to its end, emitting a snapshot after each fragment.
    ///
    /// A failure of the opening turn before any text arrived is reported as a
    /// session error; every other failure is a turn error for `id`.
    pub async fn consume<S, V>(
        &self,
        id: MessageId,
        stream: S,
        kind: TurnKind,
        view: &mut V,
    ) -> TurnOutcome
    where
        S: Stream<Item = Result<String, ProviderError>>,
        V: TutorView + ?Sized,
    {
        let mut stream = std::pin::pin!(stream);
        let mut text = String::new();
        let mut fragments = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(
                        message_id = %id,
                        fragments,
                        "Session torn down, discarding remaining fragments"
                    );
                    return TurnOutcome::Cancelled { partial: text };
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(fragment)) => {
                    fragments += 1;
                    text.push_str(&fragment);
                    view.on_fragment(id, &text);
                }
                Some(Err(e)) => {
                    let error = TurnError::from_partial(text, e);
                    warn!(message_id = %id, fragments, error = %error, "Turn failed");
                    self.report(id, kind, SessionError::Turn(error.clone()), view);
                    return TurnOutcome::Failed(error);
                }
                None => {
                    debug!(message_id = %id, fragments, chars = text.len(), "Turn complete");
                    return TurnOutcome::Completed { text };
                }
            }
        }
    }

    /// Route an error from starting a turn to the right view callback.
    ///
    /// Nothing is reported once the session has been torn down.
    pub fn report<V>(&self, id: MessageId, kind: TurnKind, error: SessionError, view: &mut V)
    where
        V: TutorView + ?Sized,
    {
        if self.cancel.is_cancelled() {
            return;
        }
        match error {
            SessionError::Turn(turn)
                if kind == TurnKind::Regular || turn.partial_text().is_some() =>
            {
                view.on_turn_error(id, &turn)
            }
            other => view.on_session_error(&other),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
