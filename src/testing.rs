//! In-memory platform fakes for unit tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::input::RawInputEvent;
use crate::resolver::accessibility::{PRESS_ACTION, attr};
use crate::resolver::pasteboard::PLAIN_TEXT;
use crate::resolver::{
    AccessibilityProvider, Application, AxElement, AxError, AxValue, ElementRef, InputSource,
    MonitorHandle, MonitorScope, PasteboardItem, PasteboardProvider, ResolverError,
};

type PressHook = Box<dyn Fn() + Send + Sync>;

/// An accessibility element backed by attribute maps, counting every
/// call made against it.
#[derive(Default)]
pub struct FakeElement {
    attributes: Mutex<HashMap<String, AxValue>>,
    parameterized: Mutex<HashMap<String, AxValue>>,
    calls: Mutex<HashMap<String, usize>>,
    on_press: Option<PressHook>,
    press_fails: bool,
    latency: Option<Duration>,
}

impl fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.attributes.lock().unwrap().get(attr::TITLE).cloned();
        f.debug_struct("FakeElement").field("title", &title).finish()
    }
}

impl FakeElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(self, name: &str, value: AxValue) -> Self {
        self.attributes.lock().unwrap().insert(name.to_string(), value);
        self
    }

    pub fn param(self, name: &str, value: AxValue) -> Self {
        self.parameterized
            .lock()
            .unwrap()
            .insert(name.to_string(), value);
        self
    }

    pub fn title(self, title: &str) -> Self {
        self.attr(attr::TITLE, AxValue::String(title.to_string()))
    }

    pub fn enabled(self, enabled: bool) -> Self {
        self.attr(attr::ENABLED, AxValue::Bool(enabled))
    }

    pub fn children(self, children: Vec<Arc<FakeElement>>) -> Self {
        let refs = children.into_iter().map(|c| c as ElementRef).collect();
        self.attr(attr::CHILDREN, AxValue::Elements(refs))
    }

    pub fn on_press(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_press = Some(Box::new(hook));
        self
    }

    pub fn press_fails(mut self) -> Self {
        self.press_fails = true;
        self
    }

    /// Block every attribute read for `latency`, simulating a hung
    /// target application.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_attr(&self, name: &str, value: AxValue) {
        self.attributes.lock().unwrap().insert(name.to_string(), value);
    }

    /// Number of calls made for an attribute or action name.
    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn presses(&self) -> usize {
        self.calls(PRESS_ACTION)
    }

    fn record(&self, name: &str) {
        *self.calls.lock().unwrap().entry(name.to_string()).or_default() += 1;
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
    }
}

impl AxElement for FakeElement {
    fn attribute(&self, name: &str) -> Result<AxValue, AxError> {
        self.record(name);
        self.attributes
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| AxError::NoValue(name.to_string()))
    }

    fn parameterized_attribute(&self, name: &str, _parameter: &AxValue) -> Result<AxValue, AxError> {
        self.record(name);
        self.parameterized
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| AxError::NoValue(name.to_string()))
    }

    fn perform_action(&self, action: &str) -> Result<(), AxError> {
        self.record(action);
        if self.press_fails {
            return Err(AxError::CannotComplete);
        }
        if action == PRESS_ACTION
            && let Some(hook) = &self.on_press
        {
            hook();
        }
        Ok(())
    }
}

/// Build an application around a root element.
pub fn fake_app(name: &str, bundle_id: &str, element: Arc<FakeElement>) -> Application {
    Application {
        name: name.to_string(),
        bundle_id: Some(bundle_id.to_string()),
        pid: 4242,
        element,
    }
}

/// Accessibility entry point with a fixed frontmost application.
pub struct FakeAccessibility {
    trusted: AtomicBool,
    app: Mutex<Option<Application>>,
    frontmost_calls: AtomicUsize,
}

impl FakeAccessibility {
    pub fn new(app: Option<Application>) -> Self {
        Self {
            trusted: AtomicBool::new(true),
            app: Mutex::new(app),
            frontmost_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_trusted(&self, trusted: bool) {
        self.trusted.store(trusted, Ordering::SeqCst);
    }

    pub fn frontmost_calls(&self) -> usize {
        self.frontmost_calls.load(Ordering::SeqCst)
    }
}

impl AccessibilityProvider for FakeAccessibility {
    fn is_trusted(&self) -> bool {
        self.trusted.load(Ordering::SeqCst)
    }

    fn frontmost_application(&self) -> Option<Application> {
        self.frontmost_calls.fetch_add(1, Ordering::SeqCst);
        self.app.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct PasteboardState {
    items: Vec<PasteboardItem>,
    change_count: i64,
    unreadable: bool,
    reject_writes: bool,
}

/// In-memory pasteboard with a change counter.
#[derive(Default)]
pub struct FakePasteboard {
    state: Mutex<PasteboardState>,
}

impl FakePasteboard {
    pub fn with_items(items: Vec<PasteboardItem>) -> Self {
        let pasteboard = Self::default();
        pasteboard.state.lock().unwrap().items = items;
        pasteboard
    }

    /// Simulate another application writing plain text.
    pub fn write_text(&self, text: &str) {
        let mut state = self.state.lock().unwrap();
        state.items = vec![PasteboardItem::text(text)];
        state.change_count += 1;
    }

    pub fn items(&self) -> Vec<PasteboardItem> {
        self.state.lock().unwrap().items.clone()
    }

    pub fn set_unreadable(&self, unreadable: bool) {
        self.state.lock().unwrap().unreadable = unreadable;
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.state.lock().unwrap().reject_writes = reject;
    }
}

impl PasteboardProvider for FakePasteboard {
    fn change_count(&self) -> Result<i64, ResolverError> {
        Ok(self.state.lock().unwrap().change_count)
    }

    fn read_items(&self) -> Result<Vec<PasteboardItem>, ResolverError> {
        let state = self.state.lock().unwrap();
        if state.unreadable {
            return Err(ResolverError::Pasteboard(
                "representation com.example.private unreadable".into(),
            ));
        }
        Ok(state.items.clone())
    }

    fn replace_items(&self, items: &[PasteboardItem]) -> Result<(), ResolverError> {
        let mut state = self.state.lock().unwrap();
        if state.reject_writes {
            return Err(ResolverError::Pasteboard("write rejected".into()));
        }
        state.items = items.to_vec();
        state.change_count += 1;
        Ok(())
    }

    fn read_string(&self) -> Result<Option<String>, ResolverError> {
        let state = self.state.lock().unwrap();
        Ok(state.items.first().and_then(|item| {
            item.representations
                .iter()
                .find(|r| r.kind == PLAIN_TEXT)
                .map(|r| String::from_utf8_lossy(&r.data).into_owned())
        }))
    }
}

/// Input source whose taps are driven by [`FakeInputSource::emit`].
#[derive(Default)]
pub struct FakeInputSource {
    deny: bool,
    starts: AtomicUsize,
    active: Arc<AtomicUsize>,
    taps: Mutex<Vec<UnboundedSender<RawInputEvent>>>,
}

impl FakeInputSource {
    /// A source that refuses every tap, as without Input Monitoring
    /// permission.
    pub fn denying() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Deliver an event to every tap.
    pub fn emit(&self, event: RawInputEvent) {
        for tap in self.taps.lock().unwrap().iter() {
            let _ = tap.send(event);
        }
    }
}

impl InputSource for FakeInputSource {
    fn start(
        &self,
        _scope: MonitorScope,
        events: UnboundedSender<RawInputEvent>,
    ) -> Result<MonitorHandle, ResolverError> {
        if self.deny {
            return Err(ResolverError::Input("event tap not permitted".into()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        self.taps.lock().unwrap().push(events);
        let active = Arc::clone(&self.active);
        Ok(MonitorHandle::new(move || {
            active.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}
