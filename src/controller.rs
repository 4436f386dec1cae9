//! The Idle / Sampling / Shown state machine behind the overlay.
//!
//! Everything here runs on the UI thread. The only suspension, the pick
//! itself, happens elsewhere: [`Controller::activate`] hands out a
//! [`CancelToken`] and the outcome comes back through [`Controller::complete`].

use crate::clipboard::ClipboardSink;
use crate::listeners::{ListenerHost, ListenerKind, ListenerSet};
use crate::presenter::{self, OverlayState, DEFAULT_POINTER_OFFSET};
use crate::sampler::{CancelToken, SampleOutcome};

/// The window (or test double) the overlay state is rendered into.
pub trait OverlaySurface {
    fn show(&mut self, state: &OverlayState);
    fn move_to(&mut self, position: (i32, i32));
    fn hide(&mut self);

    /// Physical pixels per logical pixel on the overlay's display.
    fn scale_factor(&self) -> f32 {
        1.0
    }
}

#[derive(Debug)]
enum Phase {
    Idle,
    Sampling(CancelToken),
    Shown,
    /// Terminal: no capturable display.
    Unsupported,
}

#[derive(Debug)]
pub enum Activation {
    /// Run the sampler with this token and pass the outcome to `complete`.
    Start(CancelToken),
    Busy,
    Unavailable,
}

pub struct Controller<S, C, H> {
    surface: S,
    clipboard: C,
    listeners: ListenerSet<H>,
    phase: Phase,
    overlay: OverlayState,
    pointer: (i32, i32),
    screen: Option<(i32, i32)>,
    pointer_offset: i32,
    autocopy: bool,
    press: Option<u64>,
    next_press: u64,
}

impl<S, C, H> Controller<S, C, H>
where
    S: OverlaySurface,
    C: ClipboardSink,
    H: ListenerHost,
{
    pub fn new(surface: S, clipboard: C, host: H, screen: Option<(i32, i32)>) -> Self {
        Self {
            surface,
            clipboard,
            listeners: ListenerSet::new(host),
            phase: Phase::Idle,
            overlay: OverlayState::hidden(),
            pointer: (0, 0),
            screen,
            pointer_offset: DEFAULT_POINTER_OFFSET,
            autocopy: false,
            press: None,
            next_press: 0,
        }
    }

    pub fn set_pointer_offset(&mut self, offset: i32) {
        self.pointer_offset = offset;
    }

    pub fn set_autocopy(&mut self, autocopy: bool) {
        self.autocopy = autocopy;
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn is_shown(&self) -> bool {
        matches!(self.phase, Phase::Shown)
    }

    pub fn is_sampling(&self) -> bool {
        matches!(self.phase, Phase::Sampling(_))
    }

    /// Shows the unsupported message. The controller never samples afterwards.
    pub fn report_unsupported(&mut self) {
        self.listeners.clear();
        self.phase = Phase::Unsupported;
        self.overlay = presenter::unsupported();
        self.place();
        self.surface.show(&self.overlay);
    }

    pub fn activate(&mut self) -> Activation {
        match self.phase {
            Phase::Unsupported => return Activation::Unavailable,
            Phase::Sampling(_) => return Activation::Busy,
            Phase::Idle | Phase::Shown => {}
        }
        if self.is_shown() {
            self.dismiss();
        }
        let cancel = CancelToken::new();
        self.phase = Phase::Sampling(cancel.clone());
        Activation::Start(cancel)
    }

    /// Presents a sampler outcome. Returns false for results nobody is waiting for.
    pub fn complete(&mut self, outcome: SampleOutcome) -> bool {
        if !self.is_sampling() {
            log::debug!("dropping stale sample result");
            return false;
        }
        self.overlay = presenter::present(outcome);
        self.place();
        self.surface.show(&self.overlay);
        self.listeners.attach_all();
        self.phase = Phase::Shown;

        if self.autocopy && outcome.is_ok() {
            self.copy();
        }
        true
    }

    /// Follows the pointer while a result is shown. The overlay holds still
    /// while the pointer is on it or within the offset of it, so it can be pressed.
    pub fn pointer_moved(&mut self, x: i32, y: i32) {
        self.pointer = (x, y);
        if !self.is_shown() || !self.overlay.visible {
            return;
        }
        let size = self.overlay_size();
        if presenter::near_overlay(self.pointer, self.overlay.position, size, self.pointer_offset) {
            return;
        }
        self.place();
        self.surface.move_to(self.overlay.position);
    }

    /// Cancels a pending pick, or dismisses the overlay.
    pub fn escape_pressed(&mut self) -> bool {
        if let Phase::Sampling(cancel) = &self.phase {
            cancel.cancel();
            return true;
        }
        if self.is_shown() && self.listeners.is_active(ListenerKind::Escape) {
            self.dismiss();
            return true;
        }
        false
    }

    /// Any click dismisses, including one on the overlay itself. In the
    /// unsupported state a click only hides the message.
    pub fn click(&mut self) -> bool {
        if matches!(self.phase, Phase::Unsupported) {
            return self.hide_unsupported();
        }
        if self.is_shown() && self.listeners.is_active(ListenerKind::OutsideClick) {
            self.dismiss();
            return true;
        }
        false
    }

    pub fn copy_shortcut(&mut self) -> bool {
        if self.is_shown() && self.listeners.is_active(ListenerKind::CopyShortcut) {
            return self.copy();
        }
        false
    }

    /// Pointer went down on the overlay. The returned token is passed back to
    /// [`Controller::long_press_elapsed`] once the hold threshold has passed.
    pub fn press_started(&mut self) -> Option<u64> {
        if matches!(self.phase, Phase::Unsupported) {
            self.hide_unsupported();
            return None;
        }
        if !self.is_shown() {
            return None;
        }
        self.next_press += 1;
        self.press = Some(self.next_press);
        self.press
    }

    pub fn press_released(&mut self) {
        self.press = None;
    }

    pub fn long_press_elapsed(&mut self, token: u64) -> bool {
        if self.press != Some(token) || !self.is_shown() {
            return false;
        }
        self.press = None;
        self.copy()
    }

    pub fn shutdown(&mut self) {
        if let Phase::Sampling(cancel) = &self.phase {
            cancel.cancel();
        }
        if !matches!(self.phase, Phase::Unsupported) {
            self.dismiss();
        }
    }

    fn dismiss(&mut self) {
        self.listeners.clear();
        self.press = None;
        self.phase = Phase::Idle;
        if self.overlay.visible {
            self.overlay = OverlayState::hidden();
            self.surface.hide();
        }
    }

    fn hide_unsupported(&mut self) -> bool {
        if !self.overlay.visible {
            return false;
        }
        self.overlay = OverlayState::hidden();
        self.surface.hide();
        true
    }

    /// Writes the bare hex of the shown color. Returns true when a write was issued.
    fn copy(&mut self) -> bool {
        let Some(color) = self.overlay.background else {
            return false;
        };
        let payload = color.hex_digits();
        match self.clipboard.write_text(&payload) {
            Ok(()) => log::info!("color copied to clipboard: {}", payload),
            Err(err) => log::error!("failed to copy color to clipboard: {}", err),
        }
        true
    }

    fn overlay_size(&self) -> (i32, i32) {
        presenter::overlay_size(self.surface.scale_factor())
    }

    fn place(&mut self) {
        let size = self.overlay_size();
        self.overlay.position =
            presenter::overlay_position(self.pointer, self.pointer_offset, size, self.screen);
    }

    #[cfg(test)]
    fn surface(&self) -> &S {
        &self.surface
    }

    #[cfg(test)]
    fn clipboard(&self) -> &C {
        &self.clipboard
    }

    #[cfg(test)]
    fn listeners(&self) -> &ListenerSet<H> {
        &self.listeners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ClipboardError;
    use crate::color::{SampledColor, TextTone};
    use crate::listeners::tests::RecordingHost;
    use crate::presenter::{CANCELLED_LABEL, UNSUPPORTED_LABEL};
    use crate::sampler::{sample, Cancelled, EyeDropper, PickError};

    #[derive(Debug, Clone, PartialEq)]
    enum SurfaceCall {
        Show(OverlayState),
        Move((i32, i32)),
        Hide,
    }

    #[derive(Default)]
    struct FakeSurface {
        calls: Vec<SurfaceCall>,
        scale: Option<f32>,
    }

    impl FakeSurface {
        fn hides(&self) -> usize {
            self.calls.iter().filter(|c| **c == SurfaceCall::Hide).count()
        }
    }

    impl OverlaySurface for FakeSurface {
        fn show(&mut self, state: &OverlayState) {
            self.calls.push(SurfaceCall::Show(state.clone()));
        }

        fn move_to(&mut self, position: (i32, i32)) {
            self.calls.push(SurfaceCall::Move(position));
        }

        fn hide(&mut self) {
            self.calls.push(SurfaceCall::Hide);
        }

        fn scale_factor(&self) -> f32 {
            self.scale.unwrap_or(1.0)
        }
    }

    #[derive(Default)]
    struct FakeClipboard {
        writes: Vec<String>,
        broken: bool,
    }

    impl ClipboardSink for FakeClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.broken {
                return Err(ClipboardError::Spawn(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "no clipboard",
                )));
            }
            self.writes.push(text.to_string());
            Ok(())
        }
    }

    struct FakeDropper {
        result: Option<SampledColor>,
        opened: usize,
    }

    impl EyeDropper for FakeDropper {
        fn open(&mut self, _cancel: &CancelToken) -> Result<SampledColor, PickError> {
            self.opened += 1;
            self.result.ok_or(PickError::Cancelled)
        }
    }

    type TestController = Controller<FakeSurface, FakeClipboard, RecordingHost>;

    fn controller() -> TestController {
        Controller::new(
            FakeSurface::default(),
            FakeClipboard::default(),
            RecordingHost::default(),
            None,
        )
    }

    /// Activation followed by a synchronous pick.
    fn drive(ctl: &mut TestController, dropper: &mut FakeDropper) {
        if let Activation::Start(cancel) = ctl.activate() {
            let outcome = sample(dropper, &cancel);
            ctl.complete(outcome);
        }
    }

    fn show(ctl: &mut TestController, hex: &str) {
        let mut dropper = FakeDropper {
            result: Some(hex.parse().unwrap()),
            opened: 0,
        };
        drive(ctl, &mut dropper);
    }

    #[test]
    fn successful_sample_shows_overlay() {
        let mut ctl = controller();
        ctl.pointer_moved(100, 50);
        show(&mut ctl, "#336699");

        let overlay = ctl.overlay();
        assert!(ctl.is_shown());
        assert!(overlay.visible);
        assert_eq!(overlay.background, Some(SampledColor::from_rgb(0x33, 0x66, 0x99)));
        assert_eq!(overlay.text, TextTone::Light);
        assert_eq!(overlay.position, (110, 60));
        assert_eq!(ctl.surface().calls, vec![SurfaceCall::Show(overlay.clone())]);
        assert!(ListenerKind::ALL
            .iter()
            .all(|k| ctl.listeners().is_active(*k)));
    }

    #[test]
    fn unsupported_never_samples() {
        let mut ctl = controller();
        ctl.report_unsupported();
        let mut dropper = FakeDropper {
            result: Some(SampledColor::from_rgb(1, 2, 3)),
            opened: 0,
        };
        drive(&mut ctl, &mut dropper);
        drive(&mut ctl, &mut dropper);

        assert_eq!(dropper.opened, 0);
        assert!(matches!(ctl.activate(), Activation::Unavailable));
        assert_eq!(ctl.overlay().label, UNSUPPORTED_LABEL);
        assert!(ctl.overlay().visible);
        assert!(!ctl.escape_pressed());
        assert_eq!(ctl.surface().hides(), 0);
    }

    #[test]
    fn unsupported_message_stays_put_and_hides_on_click() {
        let mut ctl = controller();
        ctl.report_unsupported();
        let calls = ctl.surface().calls.len();
        ctl.pointer_moved(500, 400);
        assert_eq!(ctl.surface().calls.len(), calls);

        assert!(ctl.click());
        assert!(!ctl.click());
        assert_eq!(ctl.surface().hides(), 1);
        assert!(!ctl.overlay().visible);
        assert!(matches!(ctl.activate(), Activation::Unavailable));
    }

    #[test]
    fn pressing_unsupported_message_hides_it() {
        let mut ctl = controller();
        ctl.report_unsupported();
        assert_eq!(ctl.press_started(), None);
        assert_eq!(ctl.surface().hides(), 1);
        assert!(matches!(ctl.activate(), Activation::Unavailable));
    }

    #[test]
    fn double_escape_hides_once() {
        let mut ctl = controller();
        show(&mut ctl, "#112233");
        assert!(ctl.escape_pressed());
        assert!(!ctl.escape_pressed());
        assert_eq!(ctl.surface().hides(), 1);
        assert!(!ctl.overlay().visible);
        assert!(ctl.listeners().is_empty());
    }

    #[test]
    fn click_dismisses_and_detaches_everything() {
        let mut ctl = controller();
        show(&mut ctl, "#112233");
        assert!(ctl.click());
        assert!(!ctl.click());
        assert_eq!(ctl.surface().hides(), 1);
        assert!(ctl.listeners().is_empty());
        assert!(!ctl.copy_shortcut());
        assert!(ctl.clipboard().writes.is_empty());
    }

    #[test]
    fn copy_shortcut_writes_bare_hex() {
        let mut ctl = controller();
        show(&mut ctl, "#1a2b3c");
        assert_eq!(ctl.overlay().label, "Selected color: #1A2B3C");
        assert!(ctl.copy_shortcut());
        assert_eq!(ctl.clipboard().writes, vec!["1A2B3C".to_string()]);
        assert!(ctl.is_shown());
    }

    #[test]
    fn cancelled_sample_shows_blank_and_copies_nothing() {
        let mut ctl = controller();
        let mut dropper = FakeDropper { result: None, opened: 0 };
        drive(&mut ctl, &mut dropper);

        assert!(ctl.is_shown());
        assert_eq!(ctl.overlay().label, CANCELLED_LABEL);
        assert_eq!(ctl.overlay().background, None);
        assert!(!ctl.copy_shortcut());
        assert!(ctl.clipboard().writes.is_empty());
        assert!(ctl.escape_pressed());
    }

    #[test]
    fn clipboard_failure_does_not_interrupt() {
        let mut ctl = Controller::new(
            FakeSurface::default(),
            FakeClipboard {
                broken: true,
                ..Default::default()
            },
            RecordingHost::default(),
            None,
        );
        show(&mut ctl, "#445566");
        assert!(ctl.copy_shortcut());
        assert!(ctl.is_shown());
        assert!(ctl.escape_pressed());
        assert!(!ctl.overlay().visible);
    }

    #[test]
    fn escape_while_sampling_cancels_pick() {
        let mut ctl = controller();
        let Activation::Start(cancel) = ctl.activate() else {
            panic!("expected sampling to start");
        };
        assert!(ctl.escape_pressed());
        assert!(cancel.is_cancelled());
        assert!(ctl.complete(Err(Cancelled)));
        assert_eq!(ctl.overlay().label, CANCELLED_LABEL);
    }

    #[test]
    fn second_activation_while_sampling_is_busy() {
        let mut ctl = controller();
        assert!(matches!(ctl.activate(), Activation::Start(_)));
        assert!(matches!(ctl.activate(), Activation::Busy));
    }

    #[test]
    fn stale_result_is_ignored() {
        let mut ctl = controller();
        assert!(!ctl.complete(Ok(SampledColor::from_rgb(1, 1, 1))));
        assert!(ctl.surface().calls.is_empty());
        assert!(ctl.listeners().is_empty());
    }

    #[test]
    fn activation_while_shown_dismisses_first() {
        let mut ctl = controller();
        show(&mut ctl, "#123456");
        assert!(matches!(ctl.activate(), Activation::Start(_)));
        assert_eq!(ctl.surface().hides(), 1);
        assert!(ctl.listeners().is_empty());
        assert!(!ctl.overlay().visible);

        ctl.complete(Ok(SampledColor::from_rgb(0xAB, 0xCD, 0xEF)));
        // exactly one attach per kind for the second showing
        let attaches = ctl
            .listeners()
            .host()
            .calls
            .iter()
            .filter(|c| matches!(c, crate::listeners::tests::HostCall::Attach(_)))
            .count();
        assert_eq!(attaches, 6);
        assert!(ctl.is_shown());
    }

    #[test]
    fn long_press_copies() {
        let mut ctl = controller();
        show(&mut ctl, "#0A0B0C");
        let token = ctl.press_started().unwrap();
        assert!(ctl.long_press_elapsed(token));
        assert_eq!(ctl.clipboard().writes, vec!["0A0B0C".to_string()]);
        assert!(!ctl.long_press_elapsed(token));
    }

    #[test]
    fn early_release_cancels_long_press() {
        let mut ctl = controller();
        show(&mut ctl, "#0A0B0C");
        let token = ctl.press_started().unwrap();
        ctl.press_released();
        assert!(!ctl.long_press_elapsed(token));

        let first = ctl.press_started().unwrap();
        let second = ctl.press_started().unwrap();
        assert!(!ctl.long_press_elapsed(first));
        assert!(ctl.long_press_elapsed(second));
        assert_eq!(ctl.clipboard().writes.len(), 1);
    }

    #[test]
    fn long_press_needs_shown_overlay() {
        let mut ctl = controller();
        assert_eq!(ctl.press_started(), None);
        show(&mut ctl, "#0A0B0C");
        let token = ctl.press_started().unwrap();
        ctl.escape_pressed();
        assert!(!ctl.long_press_elapsed(token));
        assert!(ctl.clipboard().writes.is_empty());
    }

    #[test]
    fn pointer_tracks_only_while_visible() {
        let mut ctl = controller();
        ctl.pointer_moved(1, 1);
        assert!(ctl.surface().calls.is_empty());

        show(&mut ctl, "#000000");
        ctl.pointer_moved(400, 300);
        assert_eq!(ctl.surface().calls.last(), Some(&SurfaceCall::Move((410, 310))));
        assert_eq!(ctl.overlay().position, (410, 310));

        ctl.click();
        let before = ctl.surface().calls.len();
        ctl.pointer_moved(90, 90);
        assert_eq!(ctl.surface().calls.len(), before);
    }

    #[test]
    fn custom_offset_and_screen_bounds() {
        let mut ctl = Controller::new(
            FakeSurface::default(),
            FakeClipboard::default(),
            RecordingHost::default(),
            Some((800, 600)),
        );
        ctl.set_pointer_offset(20);
        ctl.pointer_moved(790, 10);
        show(&mut ctl, "#FFFFFF");
        assert_eq!(ctl.overlay().position, (790 - presenter::OVERLAY_WIDTH - 20, 30));
        assert_eq!(ctl.overlay().text, TextTone::Dark);
    }

    #[test]
    fn overlay_holds_still_while_pointer_approaches() {
        let mut ctl = controller();
        ctl.pointer_moved(100, 100);
        show(&mut ctl, "#000000");
        assert_eq!(ctl.overlay().position, (110, 110));

        let calls = ctl.surface().calls.len();
        ctl.pointer_moved(104, 104);
        ctl.pointer_moved(150, 130);
        assert_eq!(ctl.surface().calls.len(), calls);
        assert_eq!(ctl.overlay().position, (110, 110));

        let token = ctl.press_started().unwrap();
        assert!(ctl.long_press_elapsed(token));
        assert_eq!(ctl.clipboard().writes, vec!["000000".to_string()]);

        ctl.pointer_moved(80, 100);
        assert_eq!(ctl.overlay().position, (90, 110));
    }

    #[test]
    fn hidpi_bounds_use_physical_size() {
        let mut ctl = Controller::new(
            FakeSurface {
                scale: Some(2.0),
                ..Default::default()
            },
            FakeClipboard::default(),
            RecordingHost::default(),
            Some((3840, 2160)),
        );
        ctl.pointer_moved(3650, 100);
        show(&mut ctl, "#FFFFFF");
        assert_eq!(ctl.overlay().position, (3650 - 280 - 10, 110));
    }

    #[test]
    fn autocopy_copies_on_success_only() {
        let mut ctl = controller();
        ctl.set_autocopy(true);
        show(&mut ctl, "#ABCDEF");
        assert_eq!(ctl.clipboard().writes, vec!["ABCDEF".to_string()]);

        let mut dropper = FakeDropper { result: None, opened: 0 };
        drive(&mut ctl, &mut dropper);
        assert_eq!(ctl.clipboard().writes.len(), 1);
    }

    #[test]
    fn idle_events_are_noops() {
        let mut ctl = controller();
        assert!(!ctl.escape_pressed());
        assert!(!ctl.click());
        assert!(!ctl.copy_shortcut());
        assert!(ctl.surface().calls.is_empty());
    }

    #[test]
    fn shutdown_cancels_pending_pick() {
        let mut ctl = controller();
        let Activation::Start(cancel) = ctl.activate() else {
            panic!("expected sampling to start");
        };
        ctl.shutdown();
        assert!(cancel.is_cancelled());
        assert!(!ctl.is_sampling());
        assert!(!ctl.complete(Ok(SampledColor::from_rgb(1, 2, 3))));
    }
}
