//! One-shot, in-process commands: `probe` and `menu-state`.
//!
//! Both connect the platform adapters directly instead of going through
//! a running daemon, which makes them the quickest way to check that
//! the accessibility permission is granted and that an application's
//! menu titles are recognized.

use std::sync::Arc;

use crate::clipboard::ClipboardManager;
use crate::config::Settings;
use crate::menu::MenuAction;
use crate::resolver::{self, PlatformSet, ResolverError};
use crate::selection::{EnvMirror, TextSelectionEngine, TextSelectionError};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Platform(#[from] ResolverError),
    #[error(transparent)]
    Selection(#[from] TextSelectionError),
}

/// Acquire the current selection once. Text goes to stdout, strategy
/// and application to stderr.
pub async fn run_probe(settings: Arc<Settings>) -> Result<(), ProbeError> {
    let engine = engine(resolver::connect()?, settings);
    let selection = engine.get_selected_text().await?;
    eprintln!(
        "{} via {} (pid {})",
        selection.app.name, selection.strategy, selection.app.pid
    );
    println!("{}", selection.text);
    Ok(())
}

/// Print built-in action availability for the frontmost application.
pub async fn run_menu_state(settings: Arc<Settings>) -> Result<(), ProbeError> {
    let engine = engine(resolver::connect()?, settings);
    let availability = engine.menu_availability().await?;
    for action in MenuAction::ALL {
        let state = if availability.get(action) {
            "available"
        } else {
            "unavailable"
        };
        println!("{action:<6} {state}");
    }
    Ok(())
}

fn engine(platform: PlatformSet, settings: Arc<Settings>) -> TextSelectionEngine {
    let clipboard = Arc::new(ClipboardManager::new(platform.pasteboard));
    // No extension processes are spawned from here.
    TextSelectionEngine::new(
        platform.accessibility,
        clipboard,
        settings,
        EnvMirror::new(Vec::<String>::new()),
    )
}
