//! The single pending image attachment of the next user turn.

/// Holds at most one image (as a `data:` URI) waiting to be sent.
///
/// Attaching replaces whatever was pending; taking it for a turn empties the slot.
#[derive(Debug, Clone, Default)]
pub struct PendingAttachment {
    image: Option<String>,
}

impl PendingAttachment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an image, returning the one it replaced.
    pub fn attach(&mut self, data_uri: impl Into<String>) -> Option<String> {
        self.image.replace(data_uri.into())
    }

    /// Remove the pending image for an outgoing turn.
    pub fn take(&mut self) -> Option<String> {
        self.image.take()
    }

    pub fn is_pending(&self) -> bool {
        self.image.is_some()
    }
}
