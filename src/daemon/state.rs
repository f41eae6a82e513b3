//! Daemon state — connection roles, subscribers, the published selection
//! and the acquisition generation.
//!
//! All methods are pure state transitions with no I/O. Error strings
//! are machine-readable reasons sent back over the control socket.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ipc::protocol::{Role, SelectionPayload};

/// Unique identifier for a control-socket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Owned exclusively by the daemon loop. No concurrent access.
#[derive(Debug, Default)]
pub struct DaemonState {
    /// Handshaken connections and their roles.
    connections: HashMap<ConnectionId, Role>,
    subscribers: BTreeSet<ConnectionId>,
    /// Last successfully acquired selection.
    last_selection: Option<SelectionPayload>,
    /// Whether subscribers were last told to show a selection.
    shown: bool,
    /// Bumped on every acquisition trigger.
    generation: u64,
}

impl DaemonState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_connection(&mut self, id: ConnectionId, role: Role) {
        self.connections.insert(id, role);
    }

    /// Forget a connection and its subscription.
    pub fn remove_connection(&mut self, id: ConnectionId) {
        self.connections.remove(&id);
        self.subscribers.remove(&id);
    }

    pub fn role(&self, id: ConnectionId) -> Option<Role> {
        self.connections.get(&id).copied()
    }

    /// Subscribe a surface to pushes. Idempotent.
    ///
    /// Returns `Err("not_surface")` for any other role.
    pub fn subscribe(&mut self, id: ConnectionId) -> Result<(), &'static str> {
        match self.role(id) {
            Some(Role::Surface) => {
                self.subscribers.insert(id);
                Ok(())
            }
            _ => Err("not_surface"),
        }
    }

    pub fn subscribers(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.subscribers.iter().copied()
    }

    pub fn subscriber_count(&self) -> u32 {
        self.subscribers.len() as u32
    }

    pub fn last_selection(&self) -> Option<&SelectionPayload> {
        self.last_selection.as_ref()
    }

    /// Record a published selection; subscribers now show it.
    pub fn publish(&mut self, selection: SelectionPayload) {
        self.last_selection = Some(selection);
        self.shown = true;
    }

    /// Mark the selection hidden. Returns whether subscribers still had
    /// something on screen, i.e. whether a `dismiss` push is due.
    pub fn dismiss(&mut self) -> bool {
        std::mem::replace(&mut self.shown, false)
    }

    /// Start a new acquisition generation and return it.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Whether `generation` is the latest one started.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}
