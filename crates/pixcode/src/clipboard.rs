//! Copy-to-clipboard support.
//!
//! Generated payloads are usually pasted into a banking app's "PIX copia e
//! cola" field, so the CLI can place them on the system clipboard.

use clipboard_rs::{Clipboard, ClipboardContext};
use tracing::debug;

use crate::error::{Error, Result};

/// Somewhere a payload can be copied to.
pub trait ClipboardSink {
    /// Replace the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Clipboard`] if the clipboard cannot be written.
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard.
pub struct SystemClipboard {
    ctx: ClipboardContext,
}

impl std::fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemClipboard").finish_non_exhaustive()
    }
}

impl SystemClipboard {
    /// Connect to the system clipboard.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Clipboard`] if no clipboard is available, for
    /// example on a headless machine.
    pub fn new() -> Result<Self> {
        let ctx = ClipboardContext::new()
            .map_err(|e| Error::clipboard(format!("failed to open clipboard: {e}")))?;
        Ok(Self { ctx })
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.ctx
            .set_text(text.to_string())
            .map_err(|e| Error::clipboard(format!("failed to write clipboard: {e}")))?;
        debug!(len = text.len(), "Copied text to clipboard");
        Ok(())
    }
}

/// Copy `text` to `sink`, skipping empty strings.
///
/// Returns whether anything was copied.
///
/// # Errors
///
/// Propagates the sink's error.
pub fn copy_to(sink: &mut impl ClipboardSink, text: &str) -> Result<bool> {
    if text.is_empty() {
        debug!("Nothing to copy");
        return Ok(false);
    }
    sink.set_text(text)?;
    Ok(true)
}
