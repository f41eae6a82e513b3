//! Text selection failure taxonomy.

use crate::clipboard::{ClipboardActionError, ClipboardError};
use crate::menu::MenuActionError;

/// Why an acquisition (or one strategy of it) failed.
#[derive(Debug, thiserror::Error)]
pub enum TextSelectionError {
    #[error("accessibility permission denied")]
    AccessibilityPermissionDenied,

    #[error("AppleScript execution permission denied")]
    ScriptingPermissionDenied,

    #[error("no focused element")]
    NoFocusedElement,

    #[error("no text found")]
    NoTextFound,

    #[error("selected text is empty")]
    EmptyText,

    #[error("unsupported value type {type_name}")]
    UnsupportedType { type_name: String },

    #[error("failed to retrieve attribute {0}")]
    FailedToRetrieveAttribute(String),

    #[error("invalid AXSelectedTextMarkerRange type {type_name}")]
    InvalidMarkerRangeType { type_name: String },

    #[error("AXStringForTextMarkerRange returned an unsupported range")]
    UnsupportedMarkerRange,

    #[error("unable to get AXSelectedTextMarkerRange")]
    SelectedTextMarkerRange,

    #[error("unable to get AXStringForTextMarkerRange")]
    StringForTextMarkerRange,

    #[error("AppleScript syntax error: {0}")]
    ScriptSyntaxError(String),

    #[error("AppleScript runtime error ({code}): {message}")]
    RuntimeError { code: i64, message: String },

    #[error("unknown AppleScript error")]
    UnknownAppleScriptError,

    #[error("AppleScript unsupported command: {0}")]
    UnsupportedCommand(String),

    #[error("{0}")]
    GenericError(String),

    #[error("{operation} timed out")]
    TimedOut { operation: &'static str },

    #[error("superseded by a newer trigger")]
    Cancelled,

    #[error("application {bundle_id} is forbidden")]
    ForbiddenApp { bundle_id: String },

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error(transparent)]
    Menu(#[from] MenuActionError),
}

impl TextSelectionError {
    /// Whether this error aborts the strategy chain instead of falling
    /// through to the next strategy.
    pub fn is_fatal(&self) -> bool {
        match self {
            TextSelectionError::AccessibilityPermissionDenied
            | TextSelectionError::ScriptingPermissionDenied
            | TextSelectionError::NoFocusedElement
            | TextSelectionError::NoTextFound
            | TextSelectionError::TimedOut { .. }
            | TextSelectionError::Cancelled
            | TextSelectionError::ForbiddenApp { .. }
            | TextSelectionError::Clipboard(_) => true,
            TextSelectionError::Menu(MenuActionError::TimedOut { .. }) => true,
            _ => false,
        }
    }

    /// Map an AppleScript error number and message.
    pub fn from_apple_script(code: Option<i64>, message: Option<String>) -> Self {
        match (code, message) {
            (Some(-1713), _) => TextSelectionError::AccessibilityPermissionDenied,
            (Some(-1719), _) => TextSelectionError::ScriptingPermissionDenied,
            (Some(-1004), message) => TextSelectionError::UnsupportedCommand(
                message.unwrap_or_else(|| "Unknown command".into()),
            ),
            (Some(-2740), message) => TextSelectionError::ScriptSyntaxError(
                message.unwrap_or_else(|| "Syntax error in the script".into()),
            ),
            (Some(-1708), message) => TextSelectionError::RuntimeError {
                code: -1708,
                message: message.unwrap_or_else(|| "Unsupported operation".into()),
            },
            (Some(code), Some(message)) => TextSelectionError::RuntimeError { code, message },
            _ => TextSelectionError::UnknownAppleScriptError,
        }
    }

    /// Machine-readable kind, used on the control socket.
    pub fn kind(&self) -> &'static str {
        match self {
            TextSelectionError::AccessibilityPermissionDenied => "accessibility_permission_denied",
            TextSelectionError::ScriptingPermissionDenied => "scripting_permission_denied",
            TextSelectionError::NoFocusedElement => "no_focused_element",
            TextSelectionError::NoTextFound => "no_text_found",
            TextSelectionError::EmptyText => "empty_text",
            TextSelectionError::UnsupportedType { .. } => "unsupported_type",
            TextSelectionError::FailedToRetrieveAttribute(_) => "failed_to_retrieve_attribute",
            TextSelectionError::InvalidMarkerRangeType { .. } => "invalid_marker_range_type",
            TextSelectionError::UnsupportedMarkerRange => "unsupported_marker_range",
            TextSelectionError::SelectedTextMarkerRange => "selected_text_marker_range",
            TextSelectionError::StringForTextMarkerRange => "string_for_text_marker_range",
            TextSelectionError::ScriptSyntaxError(_) => "script_syntax_error",
            TextSelectionError::RuntimeError { .. } => "runtime_error",
            TextSelectionError::UnknownAppleScriptError => "unknown_apple_script_error",
            TextSelectionError::UnsupportedCommand(_) => "unsupported_command",
            TextSelectionError::GenericError(_) => "generic_error",
            TextSelectionError::TimedOut { .. } => "timed_out",
            TextSelectionError::Cancelled => "cancelled",
            TextSelectionError::ForbiddenApp { .. } => "forbidden_app",
            TextSelectionError::Clipboard(_) => "clipboard_failed",
            TextSelectionError::Menu(e) => match e {
                MenuActionError::MenuBarNotFound => "menu_bar_not_found",
                MenuActionError::MenuItemNotFound(_) => "menu_item_not_found",
                MenuActionError::MenuItemNotEnabled(_) => "menu_item_not_enabled",
                MenuActionError::ActionFailed(_) => "action_failed",
                MenuActionError::ClipboardNotUpdated => "clipboard_not_updated",
                MenuActionError::TimedOut { .. } => "timed_out",
                MenuActionError::Pasteboard(_) => "clipboard_failed",
            },
        }
    }
}

impl From<ClipboardActionError<MenuActionError>> for TextSelectionError {
    fn from(e: ClipboardActionError<MenuActionError>) -> Self {
        match e {
            ClipboardActionError::Clipboard(e) => TextSelectionError::Clipboard(e),
            ClipboardActionError::Action(e) => TextSelectionError::Menu(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuAction;
    use crate::resolver::ResolverError;

    #[test]
    fn apple_script_codes_map_to_kinds() {
        let map = |code, msg: Option<&str>| {
            TextSelectionError::from_apple_script(code, msg.map(str::to_string))
        };
        assert!(matches!(
            map(Some(-1713), Some("x")),
            TextSelectionError::AccessibilityPermissionDenied
        ));
        assert!(matches!(
            map(Some(-1719), None),
            TextSelectionError::ScriptingPermissionDenied
        ));
        assert!(matches!(
            map(Some(-1004), None),
            TextSelectionError::UnsupportedCommand(m) if m == "Unknown command"
        ));
        assert!(matches!(
            map(Some(-2740), Some("Expected end of line")),
            TextSelectionError::ScriptSyntaxError(m) if m == "Expected end of line"
        ));
        assert!(matches!(
            map(Some(-1708), None),
            TextSelectionError::RuntimeError { code: -1708, .. }
        ));
        assert!(matches!(
            map(Some(8), Some("JavaScript disabled")),
            TextSelectionError::RuntimeError { code: 8, .. }
        ));
        assert!(matches!(map(Some(8), None), TextSelectionError::UnknownAppleScriptError));
        assert!(matches!(map(None, Some("?")), TextSelectionError::UnknownAppleScriptError));
    }

    #[test]
    fn preconditions_are_fatal_strategy_failures_are_not() {
        assert!(TextSelectionError::AccessibilityPermissionDenied.is_fatal());
        assert!(TextSelectionError::NoFocusedElement.is_fatal());
        assert!(TextSelectionError::Cancelled.is_fatal());
        assert!(TextSelectionError::TimedOut { operation: "selected text" }.is_fatal());
        assert!(
            TextSelectionError::Clipboard(ClipboardError::Restore(ResolverError::Pasteboard(
                "x".into()
            )))
            .is_fatal()
        );

        assert!(!TextSelectionError::EmptyText.is_fatal());
        assert!(!TextSelectionError::SelectedTextMarkerRange.is_fatal());
        assert!(!TextSelectionError::UnsupportedType { type_name: "Number".into() }.is_fatal());
        assert!(!TextSelectionError::Menu(MenuActionError::MenuItemNotEnabled(MenuAction::Copy)).is_fatal());
        assert!(TextSelectionError::Menu(MenuActionError::TimedOut { operation: "press" }).is_fatal());
    }

    #[test]
    fn clipboard_failure_wins_when_converting_action_errors() {
        let err: TextSelectionError = ClipboardActionError::<MenuActionError>::Clipboard(
            ClipboardError::Save(ResolverError::Pasteboard("x".into())),
        )
        .into();
        assert_eq!(err.kind(), "clipboard_failed");

        let err: TextSelectionError =
            ClipboardActionError::Action(MenuActionError::ClipboardNotUpdated).into();
        assert_eq!(err.kind(), "clipboard_not_updated");
    }
}
