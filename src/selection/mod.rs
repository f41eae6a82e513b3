//! Text Selection Acquisition Engine.
//!
//! Given a trigger, resolves the frontmost application and its focused
//! element, then runs an ordered chain of extraction strategies until one
//! yields text. Per-strategy failures fall through to the next strategy;
//! precondition failures abort the chain (see
//! [`TextSelectionError::is_fatal`]).

mod engine;
mod env;
mod error;
mod script;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use engine::TextSelectionEngine;
pub use env::EnvMirror;
pub use error::TextSelectionError;
pub use script::{OsaScript, ScriptRunner, browser_script_for};

/// Extraction technique that produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Direct read of the focused element's selected-text attribute.
    SelectedAttribute,
    /// Selected text-marker range resolved through a parameterized query.
    TextMarker,
    /// Copy menu item pressed under clipboard save/restore.
    MenuCopy,
    /// Browser JavaScript selection via AppleScript.
    BrowserScript,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::SelectedAttribute => "selected-attribute",
            Strategy::TextMarker => "text-marker",
            Strategy::MenuCopy => "menu-copy",
            Strategy::BrowserScript => "browser-script",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application the selection came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub bundle_id: Option<String>,
    pub pid: i32,
}

/// A successful acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub text: String,
    pub strategy: Strategy,
    pub app: AppInfo,
}

/// Observable engine state, for diagnostics and UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub current_app: Option<String>,
    pub selection_method: Option<Strategy>,
    pub selected_text: Option<String>,
}
