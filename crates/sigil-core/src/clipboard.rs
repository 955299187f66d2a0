//! Clipboard collaborator interface.
//!
//! The system clipboard lives in the binary crate; the watch manager and
//! tests only see this trait. Copy failures are reported, never fatal.

use crate::error::Result;

/// Best-effort clipboard write capability.
pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> Result<()>;
}

/// A clipboard that records every copy; used by tests.
#[derive(Debug, Default)]
pub struct RecordingClipboard {
    copies: std::sync::Mutex<Vec<String>>,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copies(&self) -> Vec<String> {
        self.copies.lock().expect("clipboard log lock").clone()
    }
}

impl Clipboard for RecordingClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        self.copies
            .lock()
            .expect("clipboard log lock")
            .push(text.to_string());
        Ok(())
    }
}
