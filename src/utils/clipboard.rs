use anyhow::{anyhow, Result};
use clipboard::{ClipboardContext, ClipboardProvider};
use tracing::debug;

/// Destination for copied text. Abstracted so launchers can be tested without a display server.
#[cfg_attr(test, mockall::automock)]
pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        // The provider errors are `Box<dyn Error>` without `Send`, so they are flattened here.
        let mut context: ClipboardContext =
            ClipboardProvider::new().map_err(|e| anyhow!("Can't access the clipboard: {e}"))?;
        context
            .set_contents(text.to_owned())
            .map_err(|e| anyhow!("Can't write to the clipboard: {e}"))?;
        debug!("Copied {} bytes to clipboard", text.len());
        Ok(())
    }
}
