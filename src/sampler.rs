use std::io::{self, ErrorKind};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use device_query::{DeviceQuery, DeviceState, Keycode, MouseState};
use scrap::{Capturer, Display};

use crate::color::SampledColor;
use crate::input::Edge;

/// The user aborted the pick, or the capability could not deliver a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("color sampling cancelled")]
pub struct Cancelled;

pub type SampleOutcome = Result<SampledColor, Cancelled>;

#[derive(Debug, thiserror::Error)]
pub enum PickError {
    #[error("pick cancelled")]
    Cancelled,
    #[error("screen sampling is not supported: {0}")]
    Unsupported(String),
    #[error("screen capture failed: {0}")]
    Capture(#[from] io::Error),
    #[error("no frame was captured before the pick")]
    NoFrame,
}

/// Shared cancellation flag handed to a pending pick.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A capability that waits for the user to pick a pixel on screen.
pub trait EyeDropper {
    /// Blocks until a pixel is picked, the user presses Escape, or `cancel` fires.
    fn open(&mut self, cancel: &CancelToken) -> Result<SampledColor, PickError>;
}

/// Runs one pick. Every failure is reported as [`Cancelled`]; none of them are
/// worth more than a debug line.
pub fn sample<D: EyeDropper + ?Sized>(dropper: &mut D, cancel: &CancelToken) -> SampleOutcome {
    dropper.open(cancel).map_err(|err| {
        match err {
            PickError::Cancelled => log::debug!("pick cancelled by user"),
            other => log::debug!("pick aborted: {}", other),
        }
        Cancelled
    })
}

/// Runs [`sample`] on a worker thread and sends the outcome to `results`.
///
/// Exactly one outcome is sent per call; a panicking eyedropper reports
/// [`Cancelled`].
pub fn spawn_sample<D>(
    mut dropper: D,
    cancel: CancelToken,
    results: Sender<SampleOutcome>,
) -> io::Result<JoinHandle<()>>
where
    D: EyeDropper + Send + 'static,
{
    thread::Builder::new()
        .name("eyedropper".to_string())
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| sample(&mut dropper, &cancel)))
                .unwrap_or_else(|_| {
                    log::error!("eyedropper panicked, treating the pick as cancelled");
                    Err(Cancelled)
                });
            if results.send(outcome).is_err() {
                log::debug!("pick finished after the receiver went away");
            }
        })
}

/// Picks from the primary display using `scrap` frames and `device_query` input.
#[derive(Debug, Clone, Copy)]
pub struct ScreenEyeDropper {
    screen: (i32, i32),
    poll_interval: Duration,
}

impl ScreenEyeDropper {
    /// Checks once that the primary display can be captured.
    pub fn probe() -> Result<Self, PickError> {
        input_device()?;
        let display = Display::main().map_err(|e| PickError::Unsupported(e.to_string()))?;
        let screen = (display.width() as i32, display.height() as i32);
        Capturer::new(display).map_err(|e| PickError::Unsupported(e.to_string()))?;
        Ok(Self {
            screen,
            poll_interval: Duration::from_millis(16),
        })
    }

    pub fn screen_size(&self) -> (i32, i32) {
        self.screen
    }
}

fn input_device() -> Result<DeviceState, PickError> {
    DeviceState::checked_new()
        .ok_or_else(|| PickError::Unsupported("pointer and keyboard input unavailable".to_string()))
}

fn left_pressed(mouse: &MouseState) -> bool {
    // device_query numbers buttons from 1
    mouse.button_pressed.get(1).copied().unwrap_or(false)
}

impl EyeDropper for ScreenEyeDropper {
    fn open(&mut self, cancel: &CancelToken) -> Result<SampledColor, PickError> {
        let device = input_device()?;
        let display = Display::main().map_err(|e| PickError::Unsupported(e.to_string()))?;
        let mut capturer = Capturer::new(display)?;
        let width = capturer.width();
        let height = capturer.height();

        let mut left = Edge::new(left_pressed(&device.get_mouse()));
        let mut last_color = None;

        loop {
            if cancel.is_cancelled() {
                return Err(PickError::Cancelled);
            }

            let mouse = device.get_mouse();
            match capturer.frame() {
                Ok(frame) => {
                    if let Some(color) = pixel_at(&frame, width, height, mouse.coords) {
                        last_color = Some(color);
                    }
                }
                // no new frame yet
                Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => return Err(PickError::Capture(e)),
            }

            if left.rising(left_pressed(&mouse)) {
                return last_color.ok_or(PickError::NoFrame);
            }

            if device.get_keys().contains(&Keycode::Escape) {
                return Err(PickError::Cancelled);
            }

            thread::sleep(self.poll_interval);
        }
    }
}

/// Reads the BGRA pixel under `point`, clamped to the frame.
///
/// Rows may be padded, so the stride comes from the buffer length.
pub fn pixel_at(frame: &[u8], width: usize, height: usize, point: (i32, i32)) -> Option<SampledColor> {
    if width == 0 || height == 0 {
        return None;
    }
    let stride = frame.len() / height;
    if stride < width * 4 {
        return None;
    }
    let x = point.0.clamp(0, width as i32 - 1) as usize;
    let y = point.1.clamp(0, height as i32 - 1) as usize;
    let idx = y * stride + x * 4;
    let pixel = frame.get(idx..idx + 3)?;
    Some(SampledColor::from_rgb(pixel[2], pixel[1], pixel[0]))
}
