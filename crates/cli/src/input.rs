//! Terminal input: a stdin reader task and slash-command parsing.

use std::path::PathBuf;

use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tutor_core::profile::ModelMode;

/// What a line typed by the student asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// A message for the tutor
    Send(String),
    /// `/image <path>`: attach an image to the next message
    Attach(PathBuf),
    /// `/clear`: drop the pending image
    ClearImage,
    /// `/mode <standard|fast|thinking>`
    Mode(ModelMode),
    /// `/map`: ask for a concept map
    ConceptMap,
    Status,
    Help,
    Exit,
    Empty,
    /// A malformed or unknown command, with a message for the student
    Invalid(String),
}

pub const HELP: &str = "\
Commands:
    /image <path>   Attach an image to your next message
    /clear          Remove the pending image
    /mode <mode>    Switch response mode: standard, fast or thinking
    /map            Generate a concept map for this chapter
    /status         Show the session and model in use
    /help           Show this help
    /exit           Leave the session";

/// Classify one line of input.
///
/// A blank line sends the pending image on its own when one is attached.
pub fn parse_intent(line: &str, image_pending: bool) -> UserIntent {
    let line = line.trim();
    if line.is_empty() {
        return if image_pending {
            UserIntent::Send(String::new())
        } else {
            UserIntent::Empty
        };
    }

    if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
        return UserIntent::Exit;
    }

    let Some(command) = line.strip_prefix('/') else {
        return UserIntent::Send(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "image" | "attach" if arg.is_empty() => {
            UserIntent::Invalid("Usage: /image <path to image file>".into())
        }
        "image" | "attach" => UserIntent::Attach(PathBuf::from(arg)),
        "clear" => UserIntent::ClearImage,
        "mode" if arg.is_empty() => {
            UserIntent::Invalid("Usage: /mode <standard|fast|thinking>".into())
        }
        "mode" => match arg.parse::<ModelMode>() {
            Ok(mode) => UserIntent::Mode(mode),
            Err(e) => UserIntent::Invalid(e.to_string()),
        },
        "map" | "conceptmap" | "concept-map" => UserIntent::ConceptMap,
        "status" => UserIntent::Status,
        "help" | "?" => UserIntent::Help,
        other => UserIntent::Invalid(format!("Unknown command: /{other} (try /help)")),
    }
}

/// Read stdin line by line on a background task.
///
/// The channel closes on EOF (Ctrl+D) or a read error.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut lines = BufReader::new(io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read from stdin: {e}");
                    break;
                }
            }
        }
    });

    rx
}
