use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{
    AppInfo, EnvMirror, OsaScript, ScriptRunner, Selection, SelectionState, Strategy,
    TextSelectionError, browser_script_for,
};
use crate::clipboard::ClipboardManager;
use crate::config::Settings;
use crate::menu::{MenuAction, MenuActionFinder, MenuAvailability, probe_availability};
use crate::resolver::accessibility::{self, attr, bounded};
use crate::resolver::{AccessibilityProvider, Application, AxValue, ElementRef};

/// Runs the strategy chain against the frontmost application.
pub struct TextSelectionEngine {
    accessibility: Arc<dyn AccessibilityProvider>,
    clipboard: Arc<ClipboardManager>,
    settings: Arc<Settings>,
    finder: MenuActionFinder,
    scripts: Arc<dyn ScriptRunner>,
    env: EnvMirror,
    state: watch::Sender<SelectionState>,
}

impl TextSelectionEngine {
    pub fn new(
        accessibility: Arc<dyn AccessibilityProvider>,
        clipboard: Arc<ClipboardManager>,
        settings: Arc<Settings>,
        env: EnvMirror,
    ) -> Self {
        let finder = MenuActionFinder::new(
            Arc::clone(&settings.menu_titles),
            settings.ax_timeout,
            settings.click_settle,
        );
        let scripts = Arc::new(OsaScript::new(settings.ax_timeout));
        let (state, _) = watch::channel(SelectionState::default());
        Self {
            accessibility,
            clipboard,
            settings,
            finder,
            scripts,
            env,
            state,
        }
    }

    pub fn with_script_runner(mut self, scripts: Arc<dyn ScriptRunner>) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    /// Watch the observable state.
    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SelectionState {
        self.state.borrow().clone()
    }

    /// Acquire the current selection without external cancellation.
    pub async fn get_selected_text(&self) -> Result<Selection, TextSelectionError> {
        self.acquire(&CancellationToken::new()).await
    }

    /// Acquire the current selection.
    ///
    /// `cancel` is checked between strategies; a strategy in progress
    /// always runs to completion so a clipboard cycle is never cut short.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Selection, TextSelectionError> {
        let (app, focused) = self.resolve_target().await?;
        self.update_current_app(&app.name);

        for strategy in self.strategies(&app) {
            if cancel.is_cancelled() {
                return Err(TextSelectionError::Cancelled);
            }
            let result = match strategy {
                Strategy::SelectedAttribute => self.selected_attribute(&focused).await,
                Strategy::TextMarker => self.text_marker(&focused).await,
                Strategy::MenuCopy => self.menu_copy(&app).await,
                Strategy::BrowserScript => self.browser_script(&app).await,
            };
            match result {
                Ok(text) if text.is_empty() => {
                    tracing::debug!(%strategy, "strategy returned empty text");
                }
                Ok(text) => {
                    tracing::info!(%strategy, app = %app.name, len = text.len(), "selection acquired");
                    self.publish(&text, strategy);
                    return Ok(Selection {
                        text,
                        strategy,
                        app: app_info(&app),
                    });
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::debug!(%strategy, error = %e, "strategy failed, falling through");
                }
            }
        }
        Err(TextSelectionError::NoTextFound)
    }

    /// Copy/Cut/Paste availability in the frontmost application.
    pub async fn menu_availability(&self) -> Result<MenuAvailability, TextSelectionError> {
        let app = self.frontmost().await?;
        Ok(probe_availability(&self.finder, app.element).await)
    }

    /// Press a built-in action's menu item in the frontmost application.
    /// The pasteboard is not restored: the user wants the effect.
    pub async fn perform(&self, action: MenuAction) -> Result<(), TextSelectionError> {
        let app = self.frontmost().await?;
        let item = self.finder.find_menu_item(app.element, action).await?;
        let click = self.finder.create_click_menu_item_action(
            item,
            action,
            Arc::clone(self.clipboard.pasteboard()),
        );
        self.clipboard.perform_exclusive(|| click.run()).await?;
        tracing::info!(%action, app = %app.name, "menu action performed");
        Ok(())
    }

    async fn frontmost(&self) -> Result<Application, TextSelectionError> {
        if !self.accessibility.is_trusted() {
            return Err(TextSelectionError::AccessibilityPermissionDenied);
        }
        let ax = Arc::clone(&self.accessibility);
        let app = self
            .call("frontmost application", move || ax.frontmost_application())
            .await?
            .ok_or(TextSelectionError::NoFocusedElement)?;

        if let Some(bundle_id) = &app.bundle_id
            && self.settings.is_forbidden(bundle_id)
        {
            return Err(TextSelectionError::ForbiddenApp {
                bundle_id: bundle_id.clone(),
            });
        }
        Ok(app)
    }

    async fn resolve_target(&self) -> Result<(Application, ElementRef), TextSelectionError> {
        let app = self.frontmost().await?;
        let root = Arc::clone(&app.element);
        let focused = self
            .call("focused element", move || {
                accessibility::element_attribute(root.as_ref(), attr::FOCUSED_UI_ELEMENT)
            })
            .await?
            .map_err(|_| TextSelectionError::NoFocusedElement)?;
        Ok((app, focused))
    }

    fn strategies(&self, app: &Application) -> Vec<Strategy> {
        let mut chain = vec![Strategy::SelectedAttribute, Strategy::TextMarker];
        if self.settings.force_copy() {
            chain.push(Strategy::MenuCopy);
        }
        if self.settings.browser_script
            && app.bundle_id.as_deref().and_then(browser_script_for).is_some()
        {
            chain.push(Strategy::BrowserScript);
        }
        chain
    }

    async fn selected_attribute(&self, focused: &ElementRef) -> Result<String, TextSelectionError> {
        let element = Arc::clone(focused);
        let value = self
            .call("selected text", move || element.attribute(attr::SELECTED_TEXT))
            .await?
            .map_err(|_| TextSelectionError::FailedToRetrieveAttribute(attr::SELECTED_TEXT.into()))?;
        match value {
            AxValue::String(text) | AxValue::AttributedString(text) => Ok(text),
            other => Err(TextSelectionError::UnsupportedType {
                type_name: other.type_name().to_string(),
            }),
        }
    }

    async fn text_marker(&self, focused: &ElementRef) -> Result<String, TextSelectionError> {
        let element = Arc::clone(focused);
        self.call("text marker range", move || {
            let range = element
                .attribute(attr::SELECTED_TEXT_MARKER_RANGE)
                .map_err(|_| TextSelectionError::SelectedTextMarkerRange)?;
            if !matches!(range, AxValue::MarkerRange(_)) {
                return Err(TextSelectionError::InvalidMarkerRangeType {
                    type_name: range.type_name().to_string(),
                });
            }
            let value = element
                .parameterized_attribute(attr::STRING_FOR_TEXT_MARKER_RANGE, &range)
                .map_err(|_| TextSelectionError::StringForTextMarkerRange)?;
            value
                .into_text()
                .ok_or(TextSelectionError::UnsupportedMarkerRange)
        })
        .await?
    }

    async fn menu_copy(&self, app: &Application) -> Result<String, TextSelectionError> {
        let item = self
            .finder
            .find_menu_item(Arc::clone(&app.element), MenuAction::Copy)
            .await?;
        let click = self.finder.create_click_menu_item_action(
            item,
            MenuAction::Copy,
            Arc::clone(self.clipboard.pasteboard()),
        );
        let text = self
            .clipboard
            .perform_clipboard_action(|| click.run(), self.settings.restore_delay)
            .await?;
        text.ok_or_else(|| TextSelectionError::GenericError("pasteboard holds no plain text".into()))
    }

    async fn browser_script(&self, app: &Application) -> Result<String, TextSelectionError> {
        let script = app
            .bundle_id
            .as_deref()
            .and_then(browser_script_for)
            .ok_or_else(|| TextSelectionError::UnsupportedCommand("no selection script".into()))?;
        // osascript reports its own permission and timeout failures; they
        // say nothing about this process, so the chain falls through.
        self.scripts.run(&script).await.map_err(|e| {
            if e.is_fatal() {
                TextSelectionError::GenericError(format!("browser script: {e}"))
            } else {
                e
            }
        })
    }

    async fn call<T, F>(&self, operation: &'static str, call: F) -> Result<T, TextSelectionError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        bounded(self.settings.ax_timeout, call)
            .await
            .map_err(|_| TextSelectionError::TimedOut { operation })
    }

    fn update_current_app(&self, name: &str) {
        self.state.send_if_modified(|state| {
            if state.current_app.as_deref() == Some(name) {
                return false;
            }
            state.current_app = Some(name.to_string());
            true
        });
    }

    /// Record a new selection. Repeated identical text is not re-published.
    fn publish(&self, text: &str, strategy: Strategy) {
        let changed = self.state.send_if_modified(|state| {
            if state.selected_text.as_deref() == Some(text) {
                return false;
            }
            state.selected_text = Some(text.to_string());
            state.selection_method = Some(strategy);
            true
        });
        if changed {
            self.env.set(text);
        }
    }
}

fn app_info(app: &Application) -> AppInfo {
    AppInfo {
        name: app.name.clone(),
        bundle_id: app.bundle_id.clone(),
        pid: app.pid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::resolver::accessibility::MarkerRange;
    use crate::resolver::{PasteboardItem, PasteboardProvider, Representation};
    use crate::testing::{FakeAccessibility, FakeElement, FakePasteboard, fake_app};
    use futures::future::BoxFuture;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Harness {
        engine: TextSelectionEngine,
        app: Arc<FakeElement>,
        focused: Arc<FakeElement>,
        pasteboard: Arc<FakePasteboard>,
        accessibility: Arc<FakeAccessibility>,
    }

    fn settings(config: Config) -> Arc<Settings> {
        Arc::new(Settings::from_config(&config).unwrap())
    }

    fn fast_config() -> Config {
        Config {
            click_settle_ms: 1,
            restore_delay_ms: 0,
            ..Config::default()
        }
    }

    /// Build an engine over `focused`, with a menu bar holding a Copy item
    /// that writes `copy_text` to the pasteboard when pressed.
    fn harness(focused: FakeElement, copy_text: Option<&str>, config: Config) -> Harness {
        harness_for("com.example.Editor", focused, copy_text, config)
    }

    fn harness_for(
        bundle_id: &str,
        focused: FakeElement,
        copy_text: Option<&str>,
        config: Config,
    ) -> Harness {
        let pasteboard = Arc::new(FakePasteboard::with_items(vec![PasteboardItem {
            representations: vec![
                Representation {
                    kind: "public.html".into(),
                    data: b"<b>mine</b>".to_vec(),
                },
                Representation {
                    kind: "public.utf8-plain-text".into(),
                    data: b"mine".to_vec(),
                },
            ],
        }]));

        let mut copy = FakeElement::new().title("复制").enabled(copy_text.is_some());
        if let Some(text) = copy_text {
            let pb = Arc::clone(&pasteboard);
            let text = text.to_string();
            copy = copy.on_press(move || pb.write_text(&text));
        }
        let edit = Arc::new(FakeElement::new().title("编辑").children(vec![Arc::new(copy)]));
        let bar = Arc::new(FakeElement::new().children(vec![edit]));

        let focused = Arc::new(focused);
        let app = Arc::new(
            FakeElement::new()
                .attr(attr::FOCUSED_UI_ELEMENT, AxValue::Element(focused.clone()))
                .attr(attr::MENU_BAR, AxValue::Element(bar)),
        );
        let accessibility = Arc::new(FakeAccessibility::new(Some(fake_app(
            "Editor",
            bundle_id,
            Arc::clone(&app),
        ))));
        let clipboard = Arc::new(ClipboardManager::new(pasteboard.clone()));
        let engine = TextSelectionEngine::new(
            accessibility.clone(),
            clipboard,
            settings(config),
            EnvMirror::new(Vec::<String>::new()),
        );
        Harness {
            engine,
            app,
            focused,
            pasteboard,
            accessibility,
        }
    }

    fn marker_element(text: &str) -> FakeElement {
        FakeElement::new()
            .attr(attr::SELECTED_TEXT_MARKER_RANGE, AxValue::MarkerRange(MarkerRange::new(1u8)))
            .param(attr::STRING_FOR_TEXT_MARKER_RANGE, AxValue::String(text.into()))
    }

    #[tokio::test]
    async fn reads_selected_text_attribute() {
        let h = harness(
            FakeElement::new().attr(attr::SELECTED_TEXT, AxValue::String("hello".into())),
            None,
            fast_config(),
        );
        let selection = h.engine.get_selected_text().await.unwrap();
        assert_eq!(selection.text, "hello");
        assert_eq!(selection.strategy, Strategy::SelectedAttribute);
        assert_eq!(selection.app.name, "Editor");
        assert_eq!(h.focused.calls(attr::SELECTED_TEXT_MARKER_RANGE), 0);
    }

    #[tokio::test]
    async fn flattens_rich_text() {
        let h = harness(
            FakeElement::new().attr(attr::SELECTED_TEXT, AxValue::AttributedString("bold".into())),
            None,
            fast_config(),
        );
        let selection = h.engine.get_selected_text().await.unwrap();
        assert_eq!(selection.text, "bold");
        assert_eq!(selection.strategy, Strategy::SelectedAttribute);
    }

    #[tokio::test]
    async fn falls_back_to_text_marker() {
        let h = harness(marker_element("from marker"), None, fast_config());
        let selection = h.engine.get_selected_text().await.unwrap();
        assert_eq!(selection.text, "from marker");
        assert_eq!(selection.strategy, Strategy::TextMarker);
    }

    #[tokio::test]
    async fn unsupported_attribute_type_falls_through() {
        let focused = marker_element("marker wins")
            .attr(attr::SELECTED_TEXT, AxValue::Number(3.0));
        let h = harness(focused, None, fast_config());
        let selection = h.engine.get_selected_text().await.unwrap();
        assert_eq!(selection.strategy, Strategy::TextMarker);
    }

    #[tokio::test]
    async fn empty_attribute_text_falls_through() {
        let focused = marker_element("marker wins")
            .attr(attr::SELECTED_TEXT, AxValue::String(String::new()));
        let h = harness(focused, None, fast_config());
        let selection = h.engine.get_selected_text().await.unwrap();
        assert_eq!(selection.text, "marker wins");
    }

    #[tokio::test]
    async fn menu_copy_never_attempted_without_force_copy() {
        let h = harness(FakeElement::new(), Some("copied"), fast_config());
        let err = h.engine.get_selected_text().await.unwrap_err();
        assert!(matches!(err, TextSelectionError::NoTextFound));
        assert_eq!(h.app.calls(attr::MENU_BAR), 0);
    }

    #[tokio::test]
    async fn menu_copy_restores_pasteboard() {
        let before = {
            let h = harness(FakeElement::new(), None, fast_config());
            h.pasteboard.items()
        };
        let h = harness(
            FakeElement::new(),
            Some("copied words"),
            Config {
                force_copy: true,
                ..fast_config()
            },
        );
        let selection = h.engine.get_selected_text().await.unwrap();
        assert_eq!(selection.text, "copied words");
        assert_eq!(selection.strategy, Strategy::MenuCopy);
        assert_eq!(h.pasteboard.items(), before);
    }

    #[tokio::test]
    async fn menu_copy_restores_empty_pasteboard() {
        let h = harness(
            FakeElement::new(),
            Some("copied words"),
            Config {
                force_copy: true,
                ..fast_config()
            },
        );
        h.pasteboard.replace_items(&[]).unwrap();

        let selection = h.engine.get_selected_text().await.unwrap();
        assert_eq!(selection.text, "copied words");
        assert!(h.pasteboard.items().is_empty());
    }

    #[tokio::test]
    async fn force_copy_read_fresh_each_acquisition() {
        let h = harness(FakeElement::new(), Some("copied"), fast_config());
        assert!(h.engine.get_selected_text().await.is_err());

        h.engine.settings().set_force_copy(true);
        let selection = h.engine.get_selected_text().await.unwrap();
        assert_eq!(selection.strategy, Strategy::MenuCopy);
    }

    #[tokio::test]
    async fn disabled_copy_item_yields_no_text() {
        let h = harness(
            FakeElement::new(),
            None,
            Config {
                force_copy: true,
                ..fast_config()
            },
        );
        let err = h.engine.get_selected_text().await.unwrap_err();
        assert!(matches!(err, TextSelectionError::NoTextFound));
    }

    #[tokio::test]
    async fn unreadable_pasteboard_aborts_menu_copy() {
        let h = harness(
            FakeElement::new(),
            Some("copied"),
            Config {
                force_copy: true,
                ..fast_config()
            },
        );
        h.pasteboard.set_unreadable(true);
        let err = h.engine.get_selected_text().await.unwrap_err();
        assert!(matches!(err, TextSelectionError::Clipboard(_)));
    }

    #[tokio::test]
    async fn untrusted_process_aborts_before_any_lookup() {
        let h = harness(
            FakeElement::new().attr(attr::SELECTED_TEXT, AxValue::String("x".into())),
            None,
            fast_config(),
        );
        h.accessibility.set_trusted(false);
        let err = h.engine.get_selected_text().await.unwrap_err();
        assert!(matches!(err, TextSelectionError::AccessibilityPermissionDenied));
        assert_eq!(h.accessibility.frontmost_calls(), 0);
    }

    #[tokio::test]
    async fn no_frontmost_application() {
        let accessibility = Arc::new(FakeAccessibility::new(None));
        let engine = TextSelectionEngine::new(
            accessibility,
            Arc::new(ClipboardManager::new(Arc::new(FakePasteboard::default()))),
            Arc::new(Settings::default()),
            EnvMirror::new(Vec::<String>::new()),
        );
        let err = engine.get_selected_text().await.unwrap_err();
        assert!(matches!(err, TextSelectionError::NoFocusedElement));
    }

    #[tokio::test]
    async fn no_focused_element() {
        let app = Arc::new(FakeElement::new());
        let accessibility = Arc::new(FakeAccessibility::new(Some(fake_app("Finder", "com.apple.finder", app))));
        let engine = TextSelectionEngine::new(
            accessibility,
            Arc::new(ClipboardManager::new(Arc::new(FakePasteboard::default()))),
            Arc::new(Settings::default()),
            EnvMirror::new(Vec::<String>::new()),
        );
        let err = engine.get_selected_text().await.unwrap_err();
        assert!(matches!(err, TextSelectionError::NoFocusedElement));
    }

    #[tokio::test]
    async fn forbidden_app_aborts_before_strategies() {
        let h = harness(
            FakeElement::new().attr(attr::SELECTED_TEXT, AxValue::String("secret".into())),
            None,
            Config {
                forbidden_apps: vec![r"^com\.example\.".into()],
                ..fast_config()
            },
        );
        let err = h.engine.get_selected_text().await.unwrap_err();
        assert!(matches!(err, TextSelectionError::ForbiddenApp { ref bundle_id } if bundle_id == "com.example.Editor"));
        assert_eq!(h.focused.calls(attr::SELECTED_TEXT), 0);
    }

    #[tokio::test]
    async fn hung_application_times_out() {
        let h = harness(
            FakeElement::new().latency(Duration::from_millis(300)),
            None,
            Config {
                ax_timeout_ms: 20,
                ..fast_config()
            },
        );
        let err = h.engine.get_selected_text().await.unwrap_err();
        assert!(matches!(err, TextSelectionError::TimedOut { operation: "selected text" }));
    }

    #[tokio::test]
    async fn cancelled_before_first_strategy() {
        let h = harness(
            FakeElement::new().attr(attr::SELECTED_TEXT, AxValue::String("x".into())),
            None,
            fast_config(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = h.engine.acquire(&cancel).await.unwrap_err();
        assert!(matches!(err, TextSelectionError::Cancelled));
        assert_eq!(h.focused.calls(attr::SELECTED_TEXT), 0);
    }

    #[tokio::test]
    async fn publishes_state_only_on_change() {
        let h = harness(
            FakeElement::new().attr(attr::SELECTED_TEXT, AxValue::String("same".into())),
            None,
            fast_config(),
        );
        let mut rx = h.engine.subscribe();

        h.engine.get_selected_text().await.unwrap();
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.selected_text.as_deref(), Some("same"));
        assert_eq!(state.selection_method, Some(Strategy::SelectedAttribute));
        assert_eq!(state.current_app.as_deref(), Some("Editor"));

        h.engine.get_selected_text().await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn mirrors_text_into_environment() {
        let focused = FakeElement::new().attr(attr::SELECTED_TEXT, AxValue::String("env me".into()));
        let mut h = harness(focused, None, fast_config());
        h.engine.env = EnvMirror::new(["XPOPD_TEST_ENGINE_MIRROR"]);
        assert_eq!(std::env::var("XPOPD_TEST_ENGINE_MIRROR").as_deref(), Ok(""));

        h.engine.get_selected_text().await.unwrap();
        assert_eq!(std::env::var("XPOPD_TEST_ENGINE_MIRROR").as_deref(), Ok("env me"));
    }

    struct RecordingScripts {
        sources: Mutex<Vec<String>>,
        runs: AtomicUsize,
    }

    impl ScriptRunner for RecordingScripts {
        fn run<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<String, TextSelectionError>> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.sources.lock().unwrap().push(source.to_string());
            Box::pin(async { Ok("from browser".to_string()) })
        }
    }

    #[tokio::test]
    async fn browser_script_runs_last_for_browsers() {
        let scripts = Arc::new(RecordingScripts {
            sources: Mutex::new(Vec::new()),
            runs: AtomicUsize::new(0),
        });
        let mut h = harness_for(
            "com.apple.Safari",
            FakeElement::new(),
            None,
            Config {
                browser_script: true,
                ..fast_config()
            },
        );
        h.engine = h.engine.with_script_runner(scripts.clone());

        let selection = h.engine.get_selected_text().await.unwrap();
        assert_eq!(selection.strategy, Strategy::BrowserScript);
        assert_eq!(selection.text, "from browser");
        assert!(scripts.sources.lock().unwrap()[0].contains("com.apple.Safari"));
    }

    struct DeniedScripts;

    impl ScriptRunner for DeniedScripts {
        fn run<'a>(&'a self, _source: &'a str) -> BoxFuture<'a, Result<String, TextSelectionError>> {
            Box::pin(async { Err(TextSelectionError::from_apple_script(Some(-1713), None)) })
        }
    }

    #[tokio::test]
    async fn browser_script_failure_reads_as_no_text() {
        let mut h = harness_for(
            "com.apple.Safari",
            FakeElement::new(),
            None,
            Config {
                browser_script: true,
                ..fast_config()
            },
        );
        h.engine = h.engine.with_script_runner(Arc::new(DeniedScripts));

        let err = h.engine.get_selected_text().await.unwrap_err();
        assert!(matches!(err, TextSelectionError::NoTextFound));
    }

    #[tokio::test]
    async fn browser_script_skipped_when_disabled() {
        let scripts = Arc::new(RecordingScripts {
            sources: Mutex::new(Vec::new()),
            runs: AtomicUsize::new(0),
        });
        let mut h = harness_for("com.apple.Safari", FakeElement::new(), None, fast_config());
        h.engine = h.engine.with_script_runner(scripts.clone());

        assert!(h.engine.get_selected_text().await.is_err());
        assert_eq!(scripts.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn availability_probe_reports_copy() {
        let h = harness(FakeElement::new(), Some("x"), fast_config());
        let availability = h.engine.menu_availability().await.unwrap();
        assert!(availability.can_copy);
        assert!(!availability.can_paste);
    }

    #[tokio::test]
    async fn perform_during_menu_copy_is_not_undone_by_restore() {
        let h = harness(
            FakeElement::new(),
            Some("user copy"),
            Config {
                force_copy: true,
                restore_delay_ms: 200,
                ..fast_config()
            },
        );

        let explicit_copy = async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            h.engine.perform(MenuAction::Copy).await
        };
        let (acquired, performed) = tokio::join!(h.engine.get_selected_text(), explicit_copy);

        assert_eq!(acquired.unwrap().text, "user copy");
        performed.unwrap();
        assert_eq!(h.pasteboard.read_string().unwrap().as_deref(), Some("user copy"));
    }

    #[tokio::test]
    async fn perform_presses_without_restoring() {
        let h = harness(FakeElement::new(), Some("cut me"), fast_config());
        h.engine.perform(MenuAction::Copy).await.unwrap();
        assert_eq!(h.pasteboard.read_string().unwrap().as_deref(), Some("cut me"));
    }
}
