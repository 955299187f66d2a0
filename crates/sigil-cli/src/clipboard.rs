//! System clipboard backed by arboard.
//!
//! Initialization can fail (headless sessions, missing display server); that
//! downgrades to a disabled clipboard so conversion output keeps flowing.

use std::sync::{Arc, Mutex};

use sigil_core::{Clipboard, Result, SigilError};

struct SystemClipboard {
    inner: Mutex<arboard::Clipboard>,
}

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        let mut clipboard = self
            .inner
            .lock()
            .map_err(|_| SigilError::Clipboard("clipboard handle poisoned".to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|err| SigilError::Clipboard(err.to_string()))
    }
}

struct DisabledClipboard;

impl Clipboard for DisabledClipboard {
    fn copy(&self, _text: &str) -> Result<()> {
        Err(SigilError::Clipboard(
            "no system clipboard available".to_string(),
        ))
    }
}

/// Opens the system clipboard, falling back to a disabled one.
pub fn open() -> Arc<dyn Clipboard> {
    match arboard::Clipboard::new() {
        Ok(clipboard) => Arc::new(SystemClipboard {
            inner: Mutex::new(clipboard),
        }),
        Err(err) => {
            tracing::warn!(target: "sigil_cli", "system clipboard unavailable: {err}");
            Arc::new(DisabledClipboard)
        }
    }
}
