//! Input event monitor — tap lifecycle and combination fan-out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::{EventCombination, InputEvent, Point, RawInputEvent};
use crate::resolver::{InputSource, MonitorHandle, MonitorScope};

/// Default settle delay between a combination completing and its
/// callback running.
pub const DEFAULT_TRIGGER_DELAY: Duration = Duration::from_millis(100);

/// Owns the global and local taps, the registered combinations and the
/// last press/release locations.
///
/// Raw events arrive on the receiver returned by [`InputEventMonitor::new`];
/// the owner drains it and passes each event to
/// [`handle_event`](InputEventMonitor::handle_event).
pub struct InputEventMonitor {
    source: Arc<dyn InputSource>,
    events_tx: mpsc::UnboundedSender<RawInputEvent>,
    global: Option<MonitorHandle>,
    local: Option<MonitorHandle>,
    combinations: Vec<Box<dyn EventCombination>>,
    last_press: Option<Point>,
    last_release: Option<Point>,
    trigger_delay: Duration,
}

impl InputEventMonitor {
    pub fn new(
        source: Arc<dyn InputSource>,
        trigger_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<RawInputEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let monitor = Self {
            source,
            events_tx,
            global: None,
            local: None,
            combinations: Vec::new(),
            last_press: None,
            last_release: None,
            trigger_delay,
        };
        (monitor, events_rx)
    }

    /// Start observing device-wide input. Idempotent.
    ///
    /// A refused tap is logged and otherwise ignored: no events arrive.
    pub fn start_global_monitoring(&mut self) {
        if self.global.is_none() {
            self.global = self.install(MonitorScope::Global);
        }
    }

    /// Start observing input delivered to this process. Idempotent.
    pub fn start_local_monitoring(&mut self) {
        if self.local.is_none() {
            self.local = self.install(MonitorScope::Local);
        }
    }

    /// Release both taps. Safe to call when not started.
    pub fn stop_monitoring(&mut self) {
        let mut stopped = false;
        if let Some(handle) = self.global.take() {
            handle.stop();
            stopped = true;
        }
        if let Some(handle) = self.local.take() {
            handle.stop();
            stopped = true;
        }
        if stopped {
            tracing::info!("input monitoring stopped");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.global.is_some() || self.local.is_some()
    }

    fn install(&self, scope: MonitorScope) -> Option<MonitorHandle> {
        match self.source.start(scope, self.events_tx.clone()) {
            Ok(handle) => {
                tracing::info!(?scope, "input monitoring started");
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(?scope, error = %e, "input tap unavailable, no events will arrive");
                None
            }
        }
    }

    /// Register a combination. Dispatch follows registration order.
    pub fn add_combination(&mut self, combination: Box<dyn EventCombination>) {
        tracing::debug!(combination = combination.identifier(), "combination registered");
        self.combinations.push(combination);
    }

    /// Location of the most recent pointer press.
    pub fn last_press_location(&self) -> Option<Point> {
        self.last_press
    }

    /// Location of the most recent pointer release.
    pub fn last_release_location(&self) -> Option<Point> {
        self.last_release
    }

    /// Process one raw event and return how many combinations completed.
    ///
    /// Callbacks of completed combinations are spawned onto the current
    /// tokio runtime and run after the settle delay, so this must be
    /// called from within a runtime.
    pub fn handle_event(&mut self, raw: RawInputEvent) -> usize {
        let Some(event) = InputEvent::from_raw(raw) else {
            return 0;
        };

        match event {
            InputEvent::PointerDown(e) => self.last_press = Some(e.location),
            InputEvent::PointerUp(e) => self.last_release = Some(e.location),
            _ => {}
        }

        let mut triggered = 0;
        for combination in &mut self.combinations {
            if !combination.consume(&event) {
                continue;
            }
            triggered += 1;
            tracing::debug!(combination = combination.identifier(), "combination triggered");
            if let Some(callback) = combination.on_trigger() {
                let delay = self.trigger_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    callback();
                });
            }
        }
        triggered
    }
}

impl Drop for InputEventMonitor {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{DoubleClick, DragAndDrop, Handler, RawEventKind};
    use crate::testing::FakeInputSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw(kind: RawEventKind, x: f64, y: f64) -> RawInputEvent {
        RawInputEvent::new(kind, Point::new(x, y))
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn drag_select_fires_once_after_settle_delay() {
        let source = Arc::new(FakeInputSource::default());
        let (mut monitor, _rx) = InputEventMonitor::new(source, DEFAULT_TRIGGER_DELAY);
        let (fired, callback) = counter();
        monitor.add_combination(Box::new(DragAndDrop::new(3).with_trigger(callback)));

        let mut completions = monitor.handle_event(raw(RawEventKind::LeftMouseDown, 1.0, 1.0));
        for i in 0..5 {
            completions +=
                monitor.handle_event(raw(RawEventKind::LeftMouseDragged, 2.0 + i as f64, 1.0));
        }
        completions += monitor.handle_event(raw(RawEventKind::LeftMouseUp, 9.0, 1.0));
        assert_eq!(completions, 1);

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn records_press_and_release_locations() {
        let source = Arc::new(FakeInputSource::default());
        let (mut monitor, _rx) = InputEventMonitor::new(source, DEFAULT_TRIGGER_DELAY);
        assert!(monitor.last_press_location().is_none());

        monitor.handle_event(raw(RawEventKind::LeftMouseDown, 3.0, 4.0));
        monitor.handle_event(raw(RawEventKind::MouseMoved, 50.0, 50.0));
        monitor.handle_event(raw(RawEventKind::LeftMouseUp, 7.0, 8.0));

        assert_eq!(monitor.last_press_location(), Some(Point::new(3.0, 4.0)));
        assert_eq!(monitor.last_release_location(), Some(Point::new(7.0, 8.0)));
    }

    #[tokio::test]
    async fn every_combination_sees_every_event_in_order() {
        let source = Arc::new(FakeInputSource::default());
        let (mut monitor, _rx) = InputEventMonitor::new(source, DEFAULT_TRIGGER_DELAY);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        for name in ["first", "second"] {
            let seen = Arc::clone(&seen);
            monitor.add_combination(Box::new(Handler::new(name, move |_| {
                seen.lock().unwrap().push(name);
                true
            })));
        }
        monitor.add_combination(Box::new(DoubleClick::new()));

        let completions =
            monitor.handle_event(raw(RawEventKind::LeftMouseDown, 0.0, 0.0).with_click_count(2));
        assert_eq!(completions, 3);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn other_events_are_ignored() {
        let source = Arc::new(FakeInputSource::default());
        let (mut monitor, _rx) = InputEventMonitor::new(source, DEFAULT_TRIGGER_DELAY);
        monitor.add_combination(Box::new(Handler::new("all", |_| true)));
        assert_eq!(monitor.handle_event(raw(RawEventKind::Other, 0.0, 0.0)), 0);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let source = Arc::new(FakeInputSource::default());
        let (mut monitor, _rx) = InputEventMonitor::new(source.clone(), DEFAULT_TRIGGER_DELAY);

        monitor.stop_monitoring();
        monitor.start_global_monitoring();
        monitor.start_global_monitoring();
        monitor.start_local_monitoring();
        assert_eq!(source.starts(), 2);
        assert_eq!(source.active(), 2);

        monitor.stop_monitoring();
        monitor.stop_monitoring();
        assert_eq!(source.active(), 0);
        assert!(!monitor.is_monitoring());
    }

    #[test]
    fn denied_tap_degrades_silently() {
        let source = Arc::new(FakeInputSource::denying());
        let (mut monitor, _rx) = InputEventMonitor::new(source.clone(), DEFAULT_TRIGGER_DELAY);
        monitor.start_global_monitoring();
        assert!(!monitor.is_monitoring());
        monitor.stop_monitoring();
    }

    #[tokio::test]
    async fn tap_events_reach_the_receiver() {
        let source = Arc::new(FakeInputSource::default());
        let (mut monitor, mut rx) = InputEventMonitor::new(source.clone(), DEFAULT_TRIGGER_DELAY);
        monitor.start_global_monitoring();

        source.emit(raw(RawEventKind::ScrollWheel, 1.0, 2.0));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, RawEventKind::ScrollWheel);
    }
}
