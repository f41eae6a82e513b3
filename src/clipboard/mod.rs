//! Clipboard manager — save, act, restore.
//!
//! The system pasteboard is the one process-wide resource the acquisition
//! pipeline mutates. Borrowing writes go through
//! [`ClipboardManager::perform_clipboard_action`]: a byte-exact snapshot
//! is taken, the caller's action runs, and after a settle delay the
//! snapshot is written back. Restoration happens on every exit path,
//! including a failed action and a dropped future. Writes meant to stick
//! go through [`ClipboardManager::perform_exclusive`], which shares the
//! same lock.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::resolver::{PasteboardItem, PasteboardProvider, ResolverError};

/// Clipboard save/restore failures.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// A representation could not be read; no partial snapshot is kept.
    #[error("failed to save pasteboard: {0}")]
    Save(#[source] ResolverError),

    /// The snapshot could not be written back. The user's clipboard may
    /// have been left altered.
    #[error("failed to restore pasteboard: {0}")]
    Restore(#[source] ResolverError),

    #[error("failed to read pasteboard: {0}")]
    Read(#[source] ResolverError),
}

/// Failure of a clipboard-managed action.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardActionError<E> {
    /// Save or restore failed. Takes precedence over the action's own
    /// error.
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("{0}")]
    Action(E),
}

/// Byte-exact copy of every pasteboard item and representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    items: Vec<PasteboardItem>,
    was_empty: bool,
}

impl ClipboardSnapshot {
    pub fn new(items: Vec<PasteboardItem>) -> Self {
        let was_empty = items.is_empty();
        Self { items, was_empty }
    }

    pub fn items(&self) -> &[PasteboardItem] {
        &self.items
    }

    pub fn was_empty(&self) -> bool {
        self.was_empty
    }
}

/// Mediates all pasteboard mutation.
pub struct ClipboardManager {
    pasteboard: Arc<dyn PasteboardProvider>,
    exclusive: Mutex<()>,
}

impl ClipboardManager {
    pub fn new(pasteboard: Arc<dyn PasteboardProvider>) -> Self {
        Self {
            pasteboard,
            exclusive: Mutex::new(()),
        }
    }

    pub fn pasteboard(&self) -> &Arc<dyn PasteboardProvider> {
        &self.pasteboard
    }

    /// Snapshot the pasteboard.
    pub fn save(&self) -> Result<ClipboardSnapshot, ClipboardError> {
        let items = self.pasteboard.read_items().map_err(ClipboardError::Save)?;
        let snapshot = ClipboardSnapshot::new(items);
        tracing::debug!(
            items = snapshot.items.len(),
            empty = snapshot.was_empty,
            "pasteboard saved"
        );
        Ok(snapshot)
    }

    /// Clear the pasteboard and write back exactly the snapshot.
    pub fn restore(&self, snapshot: &ClipboardSnapshot) -> Result<(), ClipboardError> {
        restore_into(self.pasteboard.as_ref(), snapshot)
    }

    /// Current plain-text content of the pasteboard.
    pub fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        self.pasteboard.read_string().map_err(ClipboardError::Read)
    }

    /// Save the pasteboard, run `action`, wait `delay`, restore.
    ///
    /// Cycles are serialized: a second caller waits until the first has
    /// restored. The delay applies whether or not the action succeeded,
    /// since a target application may still be writing asynchronously.
    pub async fn perform_clipboard_action<F, Fut, T, E>(
        &self,
        action: F,
        delay: Duration,
    ) -> Result<T, ClipboardActionError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _exclusive = self.exclusive.lock().await;

        let snapshot = self.save()?;
        let guard = RestoreGuard::new(Arc::clone(&self.pasteboard), snapshot);

        let outcome = action().await;
        tokio::time::sleep(delay).await;

        guard.restore()?;
        outcome.map_err(ClipboardActionError::Action)
    }

    /// Run `action` holding the pasteboard exclusively, without a
    /// snapshot. For writes the user asked for, such as a built-in Copy,
    /// which must neither race a save/restore cycle nor be undone by one.
    pub async fn perform_exclusive<F, Fut, T>(&self, action: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _exclusive = self.exclusive.lock().await;
        action().await
    }
}

fn restore_into(
    pasteboard: &dyn PasteboardProvider,
    snapshot: &ClipboardSnapshot,
) -> Result<(), ClipboardError> {
    let items: &[PasteboardItem] = if snapshot.was_empty {
        &[]
    } else {
        &snapshot.items
    };
    pasteboard
        .replace_items(items)
        .map_err(ClipboardError::Restore)?;
    tracing::debug!(items = items.len(), "pasteboard restored");
    Ok(())
}

/// Restores a snapshot when dropped unless already restored explicitly.
struct RestoreGuard {
    pasteboard: Arc<dyn PasteboardProvider>,
    snapshot: Option<ClipboardSnapshot>,
}

impl RestoreGuard {
    fn new(pasteboard: Arc<dyn PasteboardProvider>, snapshot: ClipboardSnapshot) -> Self {
        Self {
            pasteboard,
            snapshot: Some(snapshot),
        }
    }

    fn restore(mut self) -> Result<(), ClipboardError> {
        match self.snapshot.take() {
            Some(snapshot) => restore_into(self.pasteboard.as_ref(), &snapshot),
            None => Ok(()),
        }
    }
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            tracing::debug!("clipboard action abandoned, restoring pasteboard");
            if let Err(e) = restore_into(self.pasteboard.as_ref(), &snapshot) {
                tracing::error!(error = %e, "pasteboard restore failed");
            }
        }
    }
}
