//! Text selection capture
//!
//! Turns native selection ranges inside a rendered message into character
//! offsets over the message's plain text, debounced and published for the
//! UI to propose a note from.

mod debounce;
mod document;
mod offset;
mod tracker;

pub use debounce::Debouncer;
pub use document::{Boundary, NativeRange, NodeId, RenderedDocument};
pub use offset::{OffsetMapper, PopupPosition, TextSelection, popup_position};
pub use tracker::SelectionTracker;

/// Axis-aligned rectangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// The platform's native selection
pub trait SelectionSource: Send + Sync + 'static {
    /// The current selection, if any
    fn current_range(&self) -> Option<NativeRange>;

    /// Remove every selected range
    fn clear(&self);

    /// Bounding rectangle of `range`, if the platform can measure it
    fn bounding_rect(&self, range: &NativeRange) -> Option<Rect>;
}
