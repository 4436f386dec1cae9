use device_query::{DeviceQuery, DeviceState, Keycode};

/// Detects false -> true transitions of a polled button or key.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    prev: bool,
}

impl Edge {
    /// Seeds with the current state so a key already held does not count.
    pub fn new(pressed: bool) -> Self {
        Self { prev: pressed }
    }

    pub fn rising(&mut self, pressed: bool) -> bool {
        let rose = pressed && !self.prev;
        self.prev = pressed;
        rose
    }
}

/// A click is a press followed by a release. Presses that began before the
/// detector was (re)armed are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickDetector {
    prev: bool,
    armed: bool,
}

impl ClickDetector {
    pub fn update(&mut self, pressed: bool) -> bool {
        let clicked = match (self.prev, pressed) {
            (false, true) => {
                self.armed = true;
                false
            }
            (true, false) => std::mem::take(&mut self.armed),
            _ => false,
        };
        self.prev = pressed;
        clicked
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

/// Input observed during one poll tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputEvents {
    /// Set when the pointer moved since the last tick.
    pub pointer: Option<(i32, i32)>,
    pub escape: bool,
    pub click: bool,
}

/// Polls global pointer and keyboard state on the UI thread.
///
/// Without a reachable input device (no X display) every poll is empty.
pub struct InputPoller {
    device: Option<DeviceState>,
    last_pointer: Option<(i32, i32)>,
    escape: Edge,
    click: ClickDetector,
}

impl InputPoller {
    pub fn new() -> Self {
        let device = DeviceState::checked_new();
        if device.is_none() {
            log::warn!("global pointer and keyboard input unavailable");
        }
        Self::with_device(device)
    }

    fn with_device(device: Option<DeviceState>) -> Self {
        let held = device
            .as_ref()
            .map_or(false, |d| d.get_keys().contains(&Keycode::Escape));
        Self {
            device,
            last_pointer: None,
            escape: Edge::new(held),
            click: ClickDetector::default(),
        }
    }

    pub fn poll(&mut self) -> InputEvents {
        let Some(device) = &self.device else {
            return InputEvents::default();
        };
        let mouse = device.get_mouse();
        let pointer = (self.last_pointer != Some(mouse.coords)).then_some(mouse.coords);
        self.last_pointer = Some(mouse.coords);

        let escape = self
            .escape
            .rising(device.get_keys().contains(&Keycode::Escape));
        let left = mouse.button_pressed.get(1).copied().unwrap_or(false);
        let click = self.click.update(left);

        InputEvents { pointer, escape, click }
    }

    /// Forget any press in progress, e.g. the one that just picked a color.
    pub fn disarm_click(&mut self) {
        self.click.disarm();
    }
}
