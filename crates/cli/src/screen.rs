//! The terminal chat screen.
//!
//! `ChatScreen` is the [`TutorView`] of the terminal client. It keeps the
//! chat log and the pending image, and prints only the part of each snapshot
//! that is not on screen yet.

use std::io::Write;

use tutor_core::attachment::PendingAttachment;
use tutor_core::error::{SessionError, TurnError};
use tutor_core::message::{ChatLog, MessageId, Sender};
use tutor_core::profile::ModelMode;
use tutor_core::session::SessionConfig;
use tutor_session::TutorView;

/// Chat log plus terminal rendering.
pub struct ChatScreen<W: Write + Send> {
    out: W,
    log: ChatLog,
    attachment: PendingAttachment,
    mode: ModelMode,
    /// Bytes of the in-flight message already printed
    printed: usize,
    waiting: bool,
}

impl<W: Write + Send> ChatScreen<W> {
    pub fn new(out: W, mode: ModelMode) -> Self {
        Self {
            out,
            log: ChatLog::new(),
            attachment: PendingAttachment::new(),
            mode,
            printed: 0,
            waiting: false,
        }
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn mode(&self) -> ModelMode {
        self.mode
    }

    pub fn banner(&mut self, config: &SessionConfig, mode_status: &str) {
        self.write(format_args!(
            "\n  NCERT Master Tutor\n\n  {}  |  {}  |  {}\n  Mode:      {}\n  Response:  {}\n\n  Type /help for commands, /exit to leave.\n\n",
            config.grade,
            config.subject,
            config.chapter,
            config.mode.label(),
            mode_status,
        ));
    }

    pub fn prompt(&mut self) {
        let marker = if self.attachment.is_pending() { " [image]" } else { "" };
        self.write(format_args!("  You{marker} > "));
    }

    /// Record a user turn and open the AI bubble that will receive the reply.
    ///
    /// `text` is what the log shows, which may differ from what is sent.
    pub fn begin_user_turn(&mut self, text: &str, image: Option<String>) -> MessageId {
        self.log.push_user(text, image);
        self.begin_ai_turn()
    }

    /// Open an AI bubble and show the waiting indicator.
    pub fn begin_ai_turn(&mut self) -> MessageId {
        let id = self.log.begin_ai();
        self.printed = 0;
        self.waiting = true;
        let waiting = self.mode.waiting_text();
        self.write(format_args!("\n  Tutor > {waiting}"));
        id
    }

    /// Close the AI bubble. An empty bubble is removed instead of kept.
    pub fn finish_turn(&mut self, id: MessageId) {
        self.clear_indicator();
        let empty = self.log.get(id).is_some_and(|m| m.text.is_empty());
        if empty {
            self.log.remove(id);
        } else {
            self.log.finish(id);
        }
        self.printed = 0;
        self.write(format_args!("\n\n"));
    }

    pub fn take_attachment(&mut self) -> Option<String> {
        self.attachment.take()
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.is_pending()
    }

    pub fn attach(&mut self, data_uri: String, name: &str) {
        let replaced = self.attachment.attach(data_uri).is_some();
        let note = if replaced { " (replaced the previous image)" } else { "" };
        self.notice(&format!("Attached {name}{note}. It will be sent with your next message."));
    }

    pub fn clear_attachment(&mut self) {
        if self.attachment.take().is_some() {
            self.notice("Removed the pending image.");
        } else {
            self.notice("No image attached.");
        }
    }

    pub fn set_mode(&mut self, mode: ModelMode, status: &str) {
        self.mode = mode;
        self.notice(status);
    }

    /// Print a line outside the chat log.
    pub fn notice(&mut self, text: &str) {
        self.write(format_args!("  {text}\n"));
    }

    /// Add a system bubble and print it.
    pub fn system(&mut self, text: &str) {
        self.log.push_system(text);
        self.write(format_args!("  [!] {text}\n"));
    }

    fn clear_indicator(&mut self) {
        if self.waiting {
            self.waiting = false;
            let width = self.mode.waiting_text().len();
            self.write(format_args!("\r  Tutor > {:width$}\r  Tutor > ", ""));
        }
    }

    fn write(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(args).and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write to terminal: {e}");
        }
    }
}

impl<W: Write + Send> TutorView for ChatScreen<W> {
    fn on_fragment(&mut self, id: MessageId, snapshot: &str) {
        if !self.log.update(id, snapshot) {
            return;
        }
        self.clear_indicator();
        let fresh = snapshot.get(self.printed..).unwrap_or_default().to_string();
        self.printed = snapshot.len();
        self.write(format_args!("{fresh}"));
    }

    fn on_turn_error(&mut self, id: MessageId, error: &TurnError) {
        self.clear_indicator();
        match error {
            TurnError::Interrupted { source, .. } => {
                self.write(format_args!("\n  [Response interrupted: {source}]"));
            }
            TurnError::NotStarted(source) => {
                if self.log.get(id).is_some_and(|m| m.sender == Sender::Ai) {
                    self.log.remove(id);
                }
                self.write(format_args!("\n"));
                self.system(&format!("Error: {source}"));
            }
        }
    }

    fn on_session_error(&mut self, error: &SessionError) {
        self.clear_indicator();
        let text = match error {
            SessionError::Turn(turn) => {
                format!("Failed to start session: {}", turn.provider_error())
            }
            other => other.to_string(),
        };
        self.write(format_args!("\n"));
        self.system(&text);
    }
}
