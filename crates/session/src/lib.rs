//! The tutoring session core.
//!
//! A session follows a simple cycle:
//!
//! 1. **Start**: compose the system instruction from the base tutoring policy and
//!    the student's setup, open a backend conversation on the standard profile
//! 2. **Open**: send the fixed, mode-specific opening message so the tutor speaks first
//! 3. **Turn**: route each user turn to a profile, swap the backend conversation
//!    (carrying history over) when the profile changes, stream the response
//! 4. **Consume**: accumulate fragments and push snapshots to the view until the
//!    stream ends, fails, or the session is torn down
//!
//! Turns are strictly one at a time; overlapping calls are rejected with
//! `SessionError::Busy`.

pub mod consumer;
pub mod controller;
pub mod prompt;
#[cfg(test)]
mod test_helpers;

pub use consumer::{StreamingConsumer, TurnKind, TurnOutcome, TutorView};
pub use controller::{SessionController, TurnOptions, TurnStream};
pub use prompt::{
    BASE_POLICY, CONCEPT_MAP_LABEL, CONCEPT_MAP_PROMPT, augment_for_thinking, compose,
    opening_message,
};
