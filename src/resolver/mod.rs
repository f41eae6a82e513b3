//! Resolver abstraction — pluggable platform adapters.
//!
//! Everything that crosses a process boundary (accessibility queries
//! into other applications, the system pasteboard, the device-wide input
//! stream) sits behind a trait here. Platform adapters implement the
//! traits; the daemon composes them once at startup into a
//! [`PlatformSet`] and injects them into the components that need them.

pub mod accessibility;
pub mod input;
pub mod pasteboard;

#[cfg(target_os = "macos")]
pub mod macos;

use std::sync::Arc;

pub use accessibility::{AccessibilityProvider, Application, AxElement, AxError, AxValue, ElementRef};
pub use input::{InputSource, MonitorHandle, MonitorScope};
pub use pasteboard::{PasteboardItem, PasteboardProvider, Representation};

/// Errors returned by resolver adapters.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// Pasteboard access failed (unreadable representation, write
    /// rejected, pasteboard server unavailable).
    #[error("pasteboard: {0}")]
    Pasteboard(String),

    /// Input tap could not be installed (usually missing Input
    /// Monitoring / Accessibility permission).
    #[error("input: {0}")]
    Input(String),

    /// No adapter exists for the running platform.
    #[error("unsupported platform: {0}")]
    Unsupported(String),
}

/// A composed set of platform adapters.
///
/// Constructed at startup and shared by `Arc` with the acquisition
/// engine, the clipboard manager and the input monitor. Only one
/// adapter per sub-interface is active at runtime.
#[derive(Clone)]
pub struct PlatformSet {
    /// Queries focused elements and menus in other applications.
    pub accessibility: Arc<dyn AccessibilityProvider>,

    /// Reads, snapshots and rewrites the system pasteboard.
    pub pasteboard: Arc<dyn PasteboardProvider>,

    /// Delivers raw mouse and keyboard events.
    pub input: Arc<dyn InputSource>,
}

/// Connect the adapters for the running platform.
pub fn connect() -> Result<PlatformSet, ResolverError> {
    #[cfg(target_os = "macos")]
    {
        macos::connect()
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err(ResolverError::Unsupported(std::env::consts::OS.to_string()))
    }
}
