use crate::error::{AppError, Result};

/// Thin wrapper over the system clipboard. A missing clipboard (headless
/// session, no display server) is reported per call, never fatal.
pub struct Clipboard;

impl Clipboard {
    pub fn copy(text: &str) -> Result<()> {
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text.to_string()))
            .map_err(|e| AppError::Clipboard(e.to_string()))
    }
}
