//! Menu bar search and synthetic menu presses.

use std::sync::Arc;
use std::time::Duration;

use super::{MenuAction, MenuActionError, MenuTitleTable};
use crate::resolver::accessibility::{self, PRESS_ACTION, attr, bounded};
use crate::resolver::{AxElement, AxValue, ElementRef, PasteboardProvider};

/// Default wait after pressing a menu item before the pasteboard is
/// checked.
pub const DEFAULT_CLICK_SETTLE: Duration = Duration::from_millis(100);

/// Finds Copy/Cut/Paste items in an application's menu bar.
#[derive(Debug, Clone)]
pub struct MenuActionFinder {
    titles: Arc<MenuTitleTable>,
    ax_timeout: Duration,
    click_settle: Duration,
}

impl MenuActionFinder {
    pub fn new(titles: Arc<MenuTitleTable>, ax_timeout: Duration, click_settle: Duration) -> Self {
        Self {
            titles,
            ax_timeout,
            click_settle,
        }
    }

    /// Locate the enabled item for `action` under `application`'s menu bar,
    /// bounded by the accessibility timeout.
    pub async fn find_menu_item(
        &self,
        application: ElementRef,
        action: MenuAction,
    ) -> Result<ElementRef, MenuActionError> {
        let finder = self.clone();
        bounded(self.ax_timeout, move || {
            finder.find_menu_item_blocking(application.as_ref(), action)
        })
        .await
        .map_err(|_| MenuActionError::TimedOut {
            operation: "lookup",
        })?
    }

    /// Synchronous lookup; each step is an accessibility round-trip.
    pub fn find_menu_item_blocking(
        &self,
        application: &dyn AxElement,
        action: MenuAction,
    ) -> Result<ElementRef, MenuActionError> {
        let menu_bar = accessibility::element_attribute(application, attr::MENU_BAR)
            .map_err(|_| MenuActionError::MenuBarNotFound)?;

        let item = self
            .search(menu_bar.as_ref(), action)
            .ok_or(MenuActionError::MenuItemNotFound(action))?;

        if !is_enabled(item.as_ref()) {
            return Err(MenuActionError::MenuItemNotEnabled(action));
        }
        tracing::debug!(%action, ?item, "menu item found");
        Ok(item)
    }

    /// Depth-first search. A matching item's own subtree is searched
    /// first so a nested actionable leaf wins over its container.
    fn search(&self, element: &dyn AxElement, action: MenuAction) -> Option<ElementRef> {
        for child in accessibility::children(element) {
            if self.title_matches(child.as_ref(), action) {
                return Some(self.search(child.as_ref(), action).unwrap_or(child));
            }
            if let Some(found) = self.search(child.as_ref(), action) {
                return Some(found);
            }
        }
        None
    }

    fn title_matches(&self, element: &dyn AxElement, action: MenuAction) -> bool {
        match element.attribute(attr::TITLE) {
            Ok(AxValue::String(title)) => self.titles.matches(action, &title),
            _ => false,
        }
    }

    /// Build the press-and-verify closure for a found item.
    pub fn create_click_menu_item_action(
        &self,
        item: ElementRef,
        action: MenuAction,
        pasteboard: Arc<dyn PasteboardProvider>,
    ) -> ClickMenuItem {
        ClickMenuItem {
            item,
            action,
            pasteboard,
            ax_timeout: self.ax_timeout,
            settle: self.click_settle,
        }
    }
}

/// A missing or non-boolean enabled attribute reads as disabled.
fn is_enabled(item: &dyn AxElement) -> bool {
    matches!(item.attribute(attr::ENABLED), Ok(AxValue::Bool(true)))
}

/// Presses a menu item and verifies the pasteboard reacted.
pub struct ClickMenuItem {
    item: ElementRef,
    action: MenuAction,
    pasteboard: Arc<dyn PasteboardProvider>,
    ax_timeout: Duration,
    settle: Duration,
}

impl ClickMenuItem {
    /// Press the item, wait the settle time, and return the pasteboard
    /// text.
    ///
    /// For actions that write the pasteboard, an unchanged change counter
    /// fails with [`MenuActionError::ClipboardNotUpdated`]. Paste returns
    /// `None` without checking.
    pub async fn run(self) -> Result<Option<String>, MenuActionError> {
        let before = self
            .pasteboard
            .change_count()
            .map_err(MenuActionError::Pasteboard)?;

        let item = Arc::clone(&self.item);
        bounded(self.ax_timeout, move || item.perform_action(PRESS_ACTION))
            .await
            .map_err(|_| {
                // The press is still pending in the target application and
                // may write the pasteboard after any restore.
                tracing::warn!(action = %self.action, "menu press timed out, pasteboard may change late");
                MenuActionError::TimedOut { operation: "press" }
            })?
            .map_err(MenuActionError::ActionFailed)?;
        tracing::debug!(action = %self.action, "menu item pressed");

        tokio::time::sleep(self.settle).await;

        if !self.action.writes_clipboard() {
            return Ok(None);
        }

        let after = self
            .pasteboard
            .change_count()
            .map_err(MenuActionError::Pasteboard)?;
        if after == before {
            return Err(MenuActionError::ClipboardNotUpdated);
        }
        self.pasteboard
            .read_string()
            .map_err(MenuActionError::Pasteboard)
    }
}
