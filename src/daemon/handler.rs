//! Message dispatch and request handling.
//!
//! No I/O happens here. Requests that can be answered from
//! [`DaemonState`] are answered immediately; `acquire` and `perform`
//! need the platform and are handed back to the daemon loop as a
//! [`Reply`] to run asynchronously.

use crate::config::Settings;
use crate::input::Point;
use crate::ipc::protocol::{DaemonStatus, Message, PROTOCOL_VERSION, Role, Status};
use crate::menu::MenuAction;

use super::state::{ConnectionId, DaemonState};

/// Monitor facts the status response reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonitorView {
    pub monitoring: bool,
    pub last_press: Option<Point>,
    pub last_release: Option<Point>,
}

/// What the daemon loop must do with a request.
#[derive(Debug, PartialEq)]
pub enum Reply {
    /// Send this response now.
    Respond(Message),
    /// Start an acquisition and respond with its outcome.
    Acquire { id: u32 },
    /// Press a built-in menu item and respond with the outcome.
    Perform { id: u32, action: MenuAction },
}

/// Dispatch a request message to the appropriate handler.
///
/// Enforces:
/// - `subscribe` only from surfaces
/// - daemon-originated variants are answered with `unknown_type`
pub fn handle_message(
    state: &mut DaemonState,
    settings: &Settings,
    monitor: MonitorView,
    request: Message,
    connection_id: ConnectionId,
) -> Reply {
    match request {
        Message::Hello { id, version, role } => {
            Reply::Respond(handle_hello(state, id, version, role, connection_id))
        }
        Message::GetSelection { id } => Reply::Respond(handle_get_selection(state, id)),
        Message::Subscribe { id } => Reply::Respond(match state.subscribe(connection_id) {
            Ok(()) => Message::ok(id),
            Err(reason) => Message::error(id, reason),
        }),
        Message::Acquire { id } => Reply::Acquire { id },
        Message::SetForceCopy { id, enabled } => {
            settings.set_force_copy(enabled);
            tracing::info!(enabled, "force copy updated");
            Reply::Respond(Message::ok(id))
        }
        Message::GetStatus { id } => {
            Reply::Respond(handle_get_status(state, settings, monitor, id))
        }
        Message::Perform { id, action } => Reply::Perform { id, action },
        // Daemon-originated messages should never be sent by peers.
        Message::HelloAck { id, .. }
        | Message::Response { id, .. }
        | Message::Selection { id, .. }
        | Message::Dismiss { id } => Reply::Respond(Message::error(id, "unknown_type")),
    }
}

fn handle_hello(
    state: &mut DaemonState,
    id: u32,
    version: u32,
    role: Role,
    connection_id: ConnectionId,
) -> Message {
    if id != 0 {
        return Message::HelloAck {
            id: 0,
            status: Status::Error,
            error: Some("invalid_hello_id".into()),
        };
    }
    if version != PROTOCOL_VERSION {
        return Message::HelloAck {
            id: 0,
            status: Status::Error,
            error: Some("version_mismatch".into()),
        };
    }
    state.add_connection(connection_id, role);
    Message::HelloAck {
        id: 0,
        status: Status::Ok,
        error: None,
    }
}

fn handle_get_selection(state: &DaemonState, id: u32) -> Message {
    match state.last_selection() {
        Some(selection) => Message::Response {
            id,
            status: Status::Ok,
            error: None,
            selection: Some(selection.clone()),
            daemon: None,
        },
        None => Message::error(id, "no_selection"),
    }
}

fn handle_get_status(
    state: &DaemonState,
    settings: &Settings,
    monitor: MonitorView,
    id: u32,
) -> Message {
    Message::Response {
        id,
        status: Status::Ok,
        error: None,
        selection: None,
        daemon: Some(DaemonStatus {
            force_copy: settings.force_copy(),
            monitoring: monitor.monitoring,
            subscribers: state.subscriber_count(),
            has_selection: state.last_selection().is_some(),
            last_press: monitor.last_press,
            last_release: monitor.last_release,
        }),
    }
}
