//! Clipboard capability used by the copy action.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::domain::{AppError, Result};

/// Somewhere a short URL can be copied to.
pub trait Clipboard: Send + Sync {
    /// Place `text` on the clipboard.
    ///
    /// # Errors
    /// Returns error if the clipboard cannot be written.
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Terminal clipboard using the OSC 52 escape sequence.
///
/// Supported by most modern terminal emulators, including over SSH.
#[derive(Debug, Default, Clone, Copy)]
pub struct Osc52Clipboard;

impl Osc52Clipboard {
    fn sequence(text: &str) -> String {
        format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
    }
}

impl Clipboard for Osc52Clipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(Self::sequence(text).as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| AppError::Clipboard {
                message: format!("Failed to write to terminal: {e}"),
            })
    }
}

/// Clipboard that remembers what was copied.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Vec<String>>,
}

impl MemoryClipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently copied text.
    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Number of copies made.
    #[must_use]
    pub fn count(&self) -> usize {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
        Ok(())
    }
}
