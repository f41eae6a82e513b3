//! Input Event Monitor — gesture recognition over raw input.
//!
//! Raw events from the platform tap are mapped into the [`InputEvent`]
//! union and fanned out to every registered
//! [`EventCombination`](combination::EventCombination). A combination
//! that reports completion has its callback scheduled after a short
//! settle delay.

pub mod combination;
mod monitor;

use serde::{Deserialize, Serialize};

pub use combination::{DoubleClick, DragAndDrop, EventCombination, Handler, Scroll};
pub use monitor::InputEventMonitor;

/// Screen location in global display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Kind of a low-level event as reported by the platform tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    LeftMouseDown,
    LeftMouseDragged,
    LeftMouseUp,
    MouseMoved,
    ScrollWheel,
    KeyDown,
    KeyUp,
    /// Anything else the tap delivered; ignored by the monitor.
    Other,
}

/// A low-level event as delivered by an [`InputSource`](crate::resolver::InputSource).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawInputEvent {
    pub kind: RawEventKind,
    pub location: Point,
    /// Milliseconds since the Unix epoch at which the tap saw the event.
    pub timestamp: u64,
    /// Repeat count for mouse presses (2 for the second press of a
    /// double-click).
    pub click_count: i64,
    /// Raw platform modifier flags.
    pub modifiers: u64,
}

impl RawInputEvent {
    pub fn new(kind: RawEventKind, location: Point) -> Self {
        Self {
            kind,
            location,
            timestamp: epoch_millis(),
            click_count: 0,
            modifiers: 0,
        }
    }

    pub fn with_click_count(mut self, click_count: i64) -> Self {
        self.click_count = click_count;
        self
    }
}

/// A recognized input event, carrying the originating raw event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(RawInputEvent),
    PointerDragged(RawInputEvent),
    PointerUp(RawInputEvent),
    PointerMoved(RawInputEvent),
    Scroll(RawInputEvent),
    KeyDown(RawInputEvent),
    KeyUp(RawInputEvent),
}

impl InputEvent {
    /// Map a raw event by its concrete kind; unknown kinds map to `None`.
    pub fn from_raw(raw: RawInputEvent) -> Option<Self> {
        let event = match raw.kind {
            RawEventKind::LeftMouseDown => InputEvent::PointerDown(raw),
            RawEventKind::LeftMouseDragged => InputEvent::PointerDragged(raw),
            RawEventKind::LeftMouseUp => InputEvent::PointerUp(raw),
            RawEventKind::MouseMoved => InputEvent::PointerMoved(raw),
            RawEventKind::ScrollWheel => InputEvent::Scroll(raw),
            RawEventKind::KeyDown => InputEvent::KeyDown(raw),
            RawEventKind::KeyUp => InputEvent::KeyUp(raw),
            RawEventKind::Other => return None,
        };
        Some(event)
    }

    pub fn raw(&self) -> &RawInputEvent {
        match self {
            InputEvent::PointerDown(e)
            | InputEvent::PointerDragged(e)
            | InputEvent::PointerUp(e)
            | InputEvent::PointerMoved(e)
            | InputEvent::Scroll(e)
            | InputEvent::KeyDown(e)
            | InputEvent::KeyUp(e) => e,
        }
    }
}

/// Current time as Unix epoch milliseconds.
pub fn epoch_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
