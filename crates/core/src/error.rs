//! Error types for the tutor domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Backend failures are [`ProviderError`]; the session layer wraps them into
//! [`SessionError`] and [`TurnError`] so the presentation layer can tell a
//! failed session start apart from a failed turn.

use thiserror::Error;

// --- Backend errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

// --- Session errors ---

/// A turn that ended abnormally.
///
/// The two variants map onto what the view must do with the AI bubble:
/// drop it and show an error state, or keep the partial text that was shown.
#[derive(Debug, Clone, Error)]
pub enum TurnError {
    /// The backend failed before any text arrived.
    #[error("Response failed before any text arrived: {0}")]
    NotStarted(ProviderError),

    /// The backend failed after streaming some text.
    #[error("Response interrupted after {} characters: {source}", .partial.chars().count())]
    Interrupted {
        partial: String,
        #[source]
        source: ProviderError,
    },
}

impl TurnError {
    /// Build the right variant from whatever text was accumulated so far.
    pub fn from_partial(partial: String, source: ProviderError) -> Self {
        if partial.is_empty() {
            Self::NotStarted(source)
        } else {
            Self::Interrupted { partial, source }
        }
    }

    /// The text the view should keep showing, if any.
    pub fn partial_text(&self) -> Option<&str> {
        match self {
            Self::NotStarted(_) => None,
            Self::Interrupted { partial, .. } => Some(partial),
        }
    }

    /// The underlying backend failure.
    pub fn provider_error(&self) -> &ProviderError {
        match self {
            Self::NotStarted(e) => e,
            Self::Interrupted { source, .. } => source,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// Backend unreachable or misconfigured at session start. Fatal to the session.
    #[error("Failed to start session: {0}")]
    Initialization(#[source] ProviderError),

    #[error("Turn failed: {0}")]
    Turn(#[from] TurnError),

    /// Another turn is still streaming.
    #[error("A turn is already in progress")]
    Busy,

    #[error("Session has not been started")]
    NotStarted,
}

/// Invalid setup form input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("Unknown grade: {0} (expected Grade 6 to Grade 12)")]
    UnknownGrade(String),

    #[error("Unknown tutoring mode: {0} (expected learn, revise or doubt)")]
    UnknownMode(String),

    #[error("Unknown response mode: {0} (expected standard, fast or thinking)")]
    UnknownModelMode(String),
}
