//! Resolution-independent pin placement on a displayed image, plus the
//! pointer mapping used by the retouch view.
//!
//! All positions are stored as percentages of the displayed bounding box, so
//! the same pin renders correctly on a thumbnail, a modal or a print layout.
//! `place` does not clamp: callers only forward pointer events that are over
//! the image. Empty or non-finite bounds yield no pin.

use core_types::{CanvasSize, PinPosition};
use kurbo::{Point, Rect};

/// Drop-shadow offset, in percentage points on both axes.
pub const SHADOW_OFFSET_PERCENT: f64 = 2.0;

pub fn place(pointer: Point, bounds: Rect) -> Option<PinPosition> {
    let (width, height) = (bounds.width(), bounds.height());
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return None;
    }
    Some(PinPosition::new(
        (pointer.x - bounds.x0) / width * 100.0,
        (pointer.y - bounds.y0) / height * 100.0,
    ))
}

pub fn to_display_coordinates(pin: PinPosition, bounds: Rect) -> Point {
    Point::new(
        bounds.x0 + pin.x / 100.0 * bounds.width(),
        bounds.y0 + pin.y / 100.0 * bounds.height(),
    )
}

/// Maps a pointer over the (possibly scaled) retouch view to the canvas
/// pixel underneath it. `None` when the view has no area.
pub fn pointer_to_canvas(pointer: Point, displayed: Rect, canvas: CanvasSize) -> Option<Point> {
    let (width, height) = (displayed.width(), displayed.height());
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return None;
    }
    Some(Point::new(
        ((pointer.x - displayed.x0) * canvas.width as f64 / width).floor(),
        ((pointer.y - displayed.y0) * canvas.height as f64 / height).floor(),
    ))
}

/// Screen positions for drawing a pin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinMarker {
    pub head: Point,
    pub shadow: Point,
}

impl PinMarker {
    pub fn layout(pin: PinPosition, bounds: Rect) -> Self {
        let shadow = PinPosition::new(
            pin.x + SHADOW_OFFSET_PERCENT,
            pin.y + SHADOW_OFFSET_PERCENT,
        );
        Self {
            head: to_display_coordinates(pin, bounds),
            shadow: to_display_coordinates(shadow, bounds),
        }
    }
}

/// Pin state for one image. Re-placing overwrites; there is no pin history.
#[derive(Debug, Clone, Default)]
pub struct PinBoard {
    pin: Option<PinPosition>,
    hover: Option<PinPosition>,
    read_only: bool,
}

impl PinBoard {
    pub fn new(pin: Option<PinPosition>) -> Self {
        Self {
            pin,
            ..Self::default()
        }
    }

    pub fn read_only(pin: Option<PinPosition>) -> Self {
        Self {
            pin,
            hover: None,
            read_only: true,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn pin(&self) -> Option<PinPosition> {
        self.pin
    }

    /// Places (or moves) the pin. Ignored on a read-only board or when
    /// `bounds` is empty.
    pub fn click(&mut self, pointer: Point, bounds: Rect) -> Option<PinPosition> {
        if self.read_only {
            return None;
        }
        let pos = place(pointer, bounds)?;
        self.pin = Some(pos);
        Some(pos)
    }

    pub fn hover(&mut self, pointer: Point, bounds: Rect) {
        if self.read_only {
            return;
        }
        self.hover = place(pointer, bounds);
    }

    pub fn leave(&mut self) {
        self.hover = None;
    }

    /// Hover ghost, shown only until a pin exists.
    pub fn hover_preview(&self) -> Option<PinPosition> {
        if self.read_only || self.pin.is_some() {
            return None;
        }
        self.hover
    }

    pub fn clear(&mut self) {
        self.pin = None;
        self.hover = None;
    }

    pub fn marker(&self, bounds: Rect) -> Option<PinMarker> {
        self.pin.map(|pin| PinMarker::layout(pin, bounds))
    }
}
