//! Menu Action Finder — locating and pressing Copy/Cut/Paste in another
//! application's menu bar.
//!
//! Menu titles are localized per application and the accessibility API
//! exposes no language-independent identifier for standard Edit-menu
//! commands, so items are matched against a table of known titles.

mod availability;
mod finder;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resolver::{AxError, ResolverError};

pub use availability::{MenuAvailability, probe_availability};
pub use finder::MenuActionFinder;

/// Built-in clipboard actions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MenuAction {
    Copy,
    Cut,
    Paste,
}

impl MenuAction {
    pub const ALL: [MenuAction; 3] = [MenuAction::Copy, MenuAction::Cut, MenuAction::Paste];

    /// Whether pressing the item is expected to bump the pasteboard.
    pub fn writes_clipboard(self) -> bool {
        match self {
            MenuAction::Copy | MenuAction::Cut => true,
            MenuAction::Paste => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MenuAction::Copy => "copy",
            MenuAction::Cut => "cut",
            MenuAction::Paste => "paste",
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const COPY_TITLES: &[&str] = &[
    "Copy",
    "拷贝",
    "复制",
    "拷貝",
    "複製",
    "コピー",
    "복사",
    "Copier",
    "Copiar",
    "Copia",
    "Kopieren",
    "Копировать",
];

const CUT_TITLES: &[&str] = &[
    "Cut",
    "剪切",
    "剪下",
    "カット",
    "잘라내기",
    "Couper",
    "Cortar",
    "Taglia",
    "Ausschneiden",
    "Вырезать",
];

const PASTE_TITLES: &[&str] = &[
    "Paste",
    "粘贴",
    "貼上",
    "ペースト",
    "붙여넣기",
    "Coller",
    "Pegar",
    "Colar",
    "Incolla",
    "Einsetzen",
    "Einfügen",
    "Вставить",
];

/// Localized menu titles per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTitleTable {
    copy: BTreeSet<String>,
    cut: BTreeSet<String>,
    paste: BTreeSet<String>,
}

impl Default for MenuTitleTable {
    fn default() -> Self {
        let set = |titles: &[&str]| titles.iter().map(|t| t.to_string()).collect();
        Self {
            copy: set(COPY_TITLES),
            cut: set(CUT_TITLES),
            paste: set(PASTE_TITLES),
        }
    }
}

impl MenuTitleTable {
    /// Add titles for an action on top of the built-in ones.
    pub fn extend<I, S>(&mut self, action: MenuAction, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = self.titles_mut(action);
        set.extend(titles.into_iter().map(Into::into).filter(|t| !t.is_empty()));
    }

    pub fn titles(&self, action: MenuAction) -> &BTreeSet<String> {
        match action {
            MenuAction::Copy => &self.copy,
            MenuAction::Cut => &self.cut,
            MenuAction::Paste => &self.paste,
        }
    }

    pub fn matches(&self, action: MenuAction, title: &str) -> bool {
        self.titles(action).contains(title)
    }

    fn titles_mut(&mut self, action: MenuAction) -> &mut BTreeSet<String> {
        match action {
            MenuAction::Copy => &mut self.copy,
            MenuAction::Cut => &mut self.cut,
            MenuAction::Paste => &mut self.paste,
        }
    }
}

/// Menu lookup and invocation failures.
#[derive(Debug, thiserror::Error)]
pub enum MenuActionError {
    #[error("application has no menu bar")]
    MenuBarNotFound,

    #[error("no {0} item in the menu bar")]
    MenuItemNotFound(MenuAction),

    #[error("{0} item is disabled")]
    MenuItemNotEnabled(MenuAction),

    #[error("pressing the menu item failed: {0}")]
    ActionFailed(AxError),

    #[error("pasteboard did not change after pressing the menu item")]
    ClipboardNotUpdated,

    #[error("menu {operation} timed out")]
    TimedOut { operation: &'static str },

    #[error("pasteboard: {0}")]
    Pasteboard(#[source] ResolverError),
}
