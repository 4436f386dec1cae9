//! Transient handlers that only exist while the overlay is shown.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Escape,
    OutsideClick,
    CopyShortcut,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 3] = [
        ListenerKind::Escape,
        ListenerKind::OutsideClick,
        ListenerKind::CopyShortcut,
    ];

    fn bit(self) -> u8 {
        match self {
            ListenerKind::Escape => 1 << 0,
            ListenerKind::OutsideClick => 1 << 1,
            ListenerKind::CopyShortcut => 1 << 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to register shortcut: {0}")]
    Register(#[from] global_hotkey::Error),
}

/// Owns whatever OS resource backs a listener kind.
///
/// Only called on real transitions: never attached twice, never detached
/// while detached.
pub trait ListenerHost {
    fn attach(&mut self, kind: ListenerKind) -> Result<(), ListenerError>;
    fn detach(&mut self, kind: ListenerKind);
}

/// At most one active listener per kind.
pub struct ListenerSet<H> {
    host: H,
    active: u8,
}

impl<H: ListenerHost> ListenerSet<H> {
    pub fn new(host: H) -> Self {
        Self { host, active: 0 }
    }

    pub fn is_active(&self, kind: ListenerKind) -> bool {
        self.active & kind.bit() != 0
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Returns false when the kind was already attached or the host refused it.
    pub fn attach(&mut self, kind: ListenerKind) -> bool {
        if self.is_active(kind) {
            return false;
        }
        match self.host.attach(kind) {
            Ok(()) => {
                self.active |= kind.bit();
                true
            }
            Err(err) => {
                log::warn!("{:?} listener unavailable: {}", kind, err);
                false
            }
        }
    }

    pub fn attach_all(&mut self) {
        for kind in ListenerKind::ALL {
            self.attach(kind);
        }
    }

    /// Returns false when the kind was not attached.
    pub fn detach(&mut self, kind: ListenerKind) -> bool {
        if !self.is_active(kind) {
            return false;
        }
        self.host.detach(kind);
        self.active &= !kind.bit();
        true
    }

    pub fn clear(&mut self) {
        for kind in ListenerKind::ALL {
            self.detach(kind);
        }
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }
}
