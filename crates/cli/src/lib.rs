//! Terminal presentation layer for the NCERT tutor.
//!
//! The binary wires these pieces to a live backend; the end-to-end tests wire
//! them to a mock one.

pub mod image;
pub mod input;
pub mod screen;
pub mod turn;

pub use input::{UserIntent, parse_intent};
pub use screen::ChatScreen;
pub use turn::{TurnRequest, drive_turn};
