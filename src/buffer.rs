//! External text buffer - the seam between the pipeline and the clipboard
//!
//! The capture arrives through the same buffer the rewritten snippet goes
//! back out on. Behind a trait so the interactive loop can be tested with an
//! in-memory buffer instead of a real clipboard.

use anyhow::{Context, Result};
use arboard::Clipboard;

/// Read/write access to the buffer the user exchanges text through.
pub trait TextBuffer {
    fn read_text(&mut self) -> Result<String>;
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard implementation.
///
/// The clipboard handle is created fresh on each call to avoid holding
/// resources between cycles. Common failure cases: no display server
/// (headless Linux), permission denied.
pub struct ClipboardBuffer;

impl TextBuffer for ClipboardBuffer {
    fn read_text(&mut self) -> Result<String> {
        let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
        clipboard.get_text().context("Failed to read clipboard text")
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
        clipboard
            .set_text(text)
            .context("Failed to set clipboard text")?;
        Ok(())
    }
}
