use crate::color::{SampledColor, TextTone};
use crate::sampler::Cancelled;

pub const OVERLAY_WIDTH: i32 = 140;
pub const OVERLAY_HEIGHT: i32 = 44;
pub const DEFAULT_POINTER_OFFSET: i32 = 10;

pub const CANCELLED_LABEL: &str = "No color selected";
pub const UNSUPPORTED_LABEL: &str = "Screen sampling is not supported";

/// Everything the overlay window needs to draw itself.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub visible: bool,
    pub position: (i32, i32),
    pub label: String,
    /// `None` renders as transparent.
    pub background: Option<SampledColor>,
    pub text: TextTone,
}

impl OverlayState {
    pub fn hidden() -> Self {
        Self {
            visible: false,
            position: (0, 0),
            label: String::new(),
            background: None,
            text: TextTone::Dark,
        }
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::hidden()
    }
}

pub fn present(result: Result<SampledColor, Cancelled>) -> OverlayState {
    match result {
        Ok(color) => OverlayState {
            visible: true,
            position: (0, 0),
            label: format!("Selected color: {}", color),
            background: Some(color),
            text: color.text_tone(),
        },
        Err(Cancelled) => OverlayState {
            visible: true,
            position: (0, 0),
            label: CANCELLED_LABEL.to_string(),
            background: None,
            text: TextTone::Dark,
        },
    }
}

pub fn unsupported() -> OverlayState {
    OverlayState {
        visible: true,
        position: (0, 0),
        label: UNSUPPORTED_LABEL.to_string(),
        background: None,
        text: TextTone::Alert,
    }
}

/// Overlay size in physical pixels for a display scale factor.
pub fn overlay_size(scale: f32) -> (i32, i32) {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    (
        (OVERLAY_WIDTH as f32 * scale).round() as i32,
        (OVERLAY_HEIGHT as f32 * scale).round() as i32,
    )
}

/// Places an overlay of `size` `offset` pixels below and right of the pointer.
///
/// With a known screen size the overlay flips to the other side of the pointer
/// when it would run off an edge, and is then clamped on-screen. All values are
/// physical pixels.
pub fn overlay_position(
    pointer: (i32, i32),
    offset: i32,
    size: (i32, i32),
    screen: Option<(i32, i32)>,
) -> (i32, i32) {
    let (x, y) = pointer;
    let (width, height) = size;
    let mut pos_x = x + offset;
    let mut pos_y = y + offset;

    let Some((screen_w, screen_h)) = screen else {
        return (pos_x, pos_y);
    };

    if pos_x + width > screen_w {
        pos_x = x - width - offset;
    }
    if pos_y + height > screen_h {
        pos_y = y - height - offset;
    }

    let max_x = (screen_w - width).max(0);
    let max_y = (screen_h - height).max(0);
    (pos_x.clamp(0, max_x), pos_y.clamp(0, max_y))
}

/// Whether `pointer` is on the overlay or within `margin` pixels of its edge.
pub fn near_overlay(pointer: (i32, i32), position: (i32, i32), size: (i32, i32), margin: i32) -> bool {
    let (x, y) = pointer;
    let (left, top) = position;
    let (width, height) = size;
    (left - margin..=left + width + margin).contains(&x)
        && (top - margin..=top + height + margin).contains(&y)
}
