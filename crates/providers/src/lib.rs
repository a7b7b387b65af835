//! LLM backend implementation and model routing for the NCERT tutor.
//!
//! [`GeminiBackend`] implements the `tutor_core::Backend` trait over HTTP.
//! [`ModelRouter`] decides which model and generation settings a turn uses.

pub mod gemini;
pub mod router;

pub use gemini::{GeminiBackend, GeminiConversation};
pub use router::{ModelRouter, RouteDecision};
