//! InputSource trait — raw mouse/keyboard event delivery.
//!
//! A source installs an OS-level tap and forwards every event it sees
//! into the channel it was given, from whatever thread the platform
//! delivers on. The monitor owns the receiving side.

use tokio::sync::mpsc::UnboundedSender;

use super::ResolverError;
use crate::input::RawInputEvent;

/// Which events a tap observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorScope {
    /// Device-wide input, regardless of which application receives it.
    Global,
    /// Only input targeted at this process.
    Local,
}

/// Installs input taps.
pub trait InputSource: Send + Sync {
    /// Install a tap for `scope` and forward its events to `events`.
    ///
    /// Returns an error if the platform refuses the tap (most often a
    /// missing permission). Callers treat that as silent degradation.
    fn start(
        &self,
        scope: MonitorScope,
        events: UnboundedSender<RawInputEvent>,
    ) -> Result<MonitorHandle, ResolverError>;
}

/// Owns an installed tap; removing it is idempotent and also happens on
/// drop.
pub struct MonitorHandle {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl MonitorHandle {
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// Remove the tap.
    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("active", &self.stop.is_some())
            .finish()
    }
}
