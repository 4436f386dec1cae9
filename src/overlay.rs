use slint::{Color, ComponentHandle, LogicalPosition};

use crate::color::TextTone;
use crate::controller::OverlaySurface;
use crate::presenter::OverlayState;
use crate::SamplerOverlay;

fn tone_color(tone: TextTone) -> Color {
    match tone {
        TextTone::Dark => Color::from_rgb_u8(0x33, 0x33, 0x33),
        TextTone::Light => Color::from_rgb_u8(0xf5, 0xf5, 0xf5),
        TextTone::Alert => Color::from_rgb_u8(0xd0, 0x20, 0x20),
    }
}

/// Renders [`OverlayState`] into the frameless `SamplerOverlay` window.
pub struct SlintOverlay {
    window: slint::Weak<SamplerOverlay>,
}

impl SlintOverlay {
    pub fn new(window: slint::Weak<SamplerOverlay>) -> Self {
        Self { window }
    }
}

fn set_physical_position(overlay: &SamplerOverlay, (x, y): (i32, i32)) {
    // pointer coordinates are physical pixels
    let scale = overlay.window().scale_factor();
    overlay
        .window()
        .set_position(LogicalPosition::new(x as f32 / scale, y as f32 / scale));
}

impl OverlaySurface for SlintOverlay {
    fn show(&mut self, state: &OverlayState) {
        let Some(overlay) = self.window.upgrade() else {
            return;
        };
        overlay.set_label(state.label.as_str().into());
        overlay.set_swatch(match state.background {
            Some(color) => {
                let (r, g, b) = color.rgb();
                Color::from_rgb_u8(r, g, b)
            }
            None => Color::from_argb_u8(0, 0, 0, 0),
        });
        overlay.set_text_color(tone_color(state.text));
        set_physical_position(&overlay, state.position);
        if let Err(err) = overlay.show() {
            log::error!("could not show overlay: {}", err);
        }
    }

    fn move_to(&mut self, position: (i32, i32)) {
        if let Some(overlay) = self.window.upgrade() {
            set_physical_position(&overlay, position);
        }
    }

    fn hide(&mut self) {
        if let Some(overlay) = self.window.upgrade() {
            overlay.hide().ok();
        }
    }

    fn scale_factor(&self) -> f32 {
        self.window
            .upgrade()
            .map_or(1.0, |overlay| overlay.window().scale_factor())
    }
}
