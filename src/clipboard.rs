use std::io;
use std::thread;

use arboard::Clipboard;
#[cfg(target_os = "linux")]
use arboard::SetExtLinux;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(#[source] arboard::Error),
    #[error("failed to write clipboard: {0}")]
    Write(#[source] arboard::Error),
    #[error("could not start clipboard writer: {0}")]
    Spawn(#[from] io::Error),
}

pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard through `arboard`.
///
/// On Linux the clipboard is owned by the writing process, so the write runs
/// on a helper thread that waits until another application takes ownership.
/// Failures on that thread can only be logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

fn write_blocking(text: String) -> Result<(), ClipboardError> {
    let mut clipboard = Clipboard::new().map_err(ClipboardError::Unavailable)?;
    #[cfg(target_os = "linux")]
    let result = clipboard.set().wait().text(text);
    #[cfg(not(target_os = "linux"))]
    let result = clipboard.set_text(text);
    result.map_err(ClipboardError::Write)
}

impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_string();
        thread::Builder::new()
            .name("clipboard".to_string())
            .spawn(move || {
                if let Err(err) = write_blocking(text) {
                    log::error!("{}", err);
                }
            })?;
        Ok(())
    }
}
