//! Event combinations — stateful gesture recognizers.
//!
//! Every registered combination sees every event, in registration
//! order. `consume` reports whether the gesture just completed; the
//! monitor then schedules the combination's callback.

use std::sync::Arc;

use super::InputEvent;

/// Callback run when a combination completes.
pub type TriggerCallback = Arc<dyn Fn() + Send + Sync>;

/// A recognizer over the [`InputEvent`] stream.
pub trait EventCombination: Send {
    /// Stable name, used in logs.
    fn identifier(&self) -> &str;

    /// Feed one event; returns `true` when the gesture completes.
    fn consume(&mut self, event: &InputEvent) -> bool;

    /// Callback to schedule when `consume` returns `true`.
    fn on_trigger(&self) -> Option<TriggerCallback>;
}

/// Default number of drag events required for a drag-select.
pub const DEFAULT_DRAG_THRESHOLD: usize = 3;

/// Second (or later) press of a multi-click.
#[derive(Default)]
pub struct DoubleClick {
    callback: Option<TriggerCallback>,
}

impl DoubleClick {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trigger(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }
}

impl EventCombination for DoubleClick {
    fn identifier(&self) -> &str {
        "double-click"
    }

    fn consume(&mut self, event: &InputEvent) -> bool {
        matches!(event, InputEvent::PointerDown(raw) if raw.click_count >= 2)
    }

    fn on_trigger(&self) -> Option<TriggerCallback> {
        self.callback.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging(usize),
}

/// Press, at least `threshold` drag events, release.
pub struct DragAndDrop {
    threshold: usize,
    state: DragState,
    callback: Option<TriggerCallback>,
}

impl DragAndDrop {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            state: DragState::Idle,
            callback: None,
        }
    }

    pub fn with_trigger(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Drag events seen since the last press or reset.
    pub fn drag_count(&self) -> usize {
        match self.state {
            DragState::Idle => 0,
            DragState::Dragging(n) => n,
        }
    }
}

impl Default for DragAndDrop {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD)
    }
}

impl EventCombination for DragAndDrop {
    fn identifier(&self) -> &str {
        "drag-and-drop"
    }

    fn consume(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown(_) => {
                self.state = DragState::Idle;
                false
            }
            InputEvent::PointerDragged(_) => {
                self.state = DragState::Dragging(self.drag_count() + 1);
                false
            }
            InputEvent::PointerUp(_) => {
                let dragged = self.drag_count();
                self.state = DragState::Idle;
                dragged >= self.threshold
            }
            _ => {
                self.state = DragState::Idle;
                false
            }
        }
    }

    fn on_trigger(&self) -> Option<TriggerCallback> {
        self.callback.clone()
    }
}

/// Any scroll event.
#[derive(Default)]
pub struct Scroll {
    callback: Option<TriggerCallback>,
}

impl Scroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trigger(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }
}

impl EventCombination for Scroll {
    fn identifier(&self) -> &str {
        "scroll"
    }

    fn consume(&mut self, event: &InputEvent) -> bool {
        matches!(event, InputEvent::Scroll(_))
    }

    fn on_trigger(&self) -> Option<TriggerCallback> {
        self.callback.clone()
    }
}

/// Arbitrary predicate over the event stream.
///
/// The predicate runs synchronously on every event and may carry its own
/// side effects (e.g. arming a hover timer); returning `true` schedules
/// the trigger callback like any other combination.
pub struct Handler {
    identifier: String,
    predicate: Box<dyn FnMut(&InputEvent) -> bool + Send>,
    callback: Option<TriggerCallback>,
}

impl Handler {
    pub fn new(
        identifier: impl Into<String>,
        predicate: impl FnMut(&InputEvent) -> bool + Send + 'static,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            predicate: Box::new(predicate),
            callback: None,
        }
    }

    pub fn with_trigger(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }
}

impl EventCombination for Handler {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn consume(&mut self, event: &InputEvent) -> bool {
        (self.predicate)(event)
    }

    fn on_trigger(&self) -> Option<TriggerCallback> {
        self.callback.clone()
    }
}
