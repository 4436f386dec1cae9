use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::GlobalHotKeyManager;

use crate::listeners::{ListenerError, ListenerHost, ListenerKind};

/// Starts a pick from anywhere.
pub fn activation_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::META | Modifiers::CONTROL), Code::KeyC)
}

/// Copies the shown color. Only registered while the overlay is up.
pub fn copy_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::CONTROL), Code::KeyC)
}

/// Backs the transient listeners with OS resources.
///
/// Escape and clicks are polled every tick and need nothing here; the copy
/// shortcut is grabbed as a global hotkey only while it is attached so Ctrl+C
/// keeps working in other applications the rest of the time.
pub struct HotkeyListeners {
    manager: Option<GlobalHotKeyManager>,
    copy: HotKey,
}

impl HotkeyListeners {
    pub fn new(manager: Option<GlobalHotKeyManager>) -> Self {
        Self {
            manager,
            copy: copy_hotkey(),
        }
    }

    pub fn copy_id(&self) -> u32 {
        self.copy.id()
    }
}

impl ListenerHost for HotkeyListeners {
    fn attach(&mut self, kind: ListenerKind) -> Result<(), ListenerError> {
        match (kind, &self.manager) {
            (ListenerKind::CopyShortcut, Some(manager)) => Ok(manager.register(self.copy)?),
            _ => Ok(()),
        }
    }

    fn detach(&mut self, kind: ListenerKind) {
        if let (ListenerKind::CopyShortcut, Some(manager)) = (kind, &self.manager) {
            if let Err(err) = manager.unregister(self.copy) {
                log::warn!("could not release copy shortcut: {}", err);
            }
        }
    }
}
