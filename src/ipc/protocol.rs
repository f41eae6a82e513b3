//! Wire protocol message types for the daemon control socket.
//!
//! All messages are MessagePack-encoded maps with at minimum `type` and `id`
//! fields. Pushes from the daemon carry `id: 0`.

use serde::{Deserialize, Serialize};

use crate::input::Point;
use crate::menu::{MenuAction, MenuAvailability};
use crate::selection::{Selection, Strategy};

/// All wire protocol messages.
///
/// Serialized as a tagged union on the `type` field via MessagePack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Message {
    // -- Handshake --
    #[serde(rename = "hello")]
    Hello { id: u32, version: u32, role: Role },

    #[serde(rename = "hello_ack")]
    HelloAck {
        id: u32,
        status: Status,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    // -- Requests --
    #[serde(rename = "get_selection")]
    GetSelection { id: u32 },

    /// Surface role only: receive `selection` and `dismiss` pushes.
    #[serde(rename = "subscribe")]
    Subscribe { id: u32 },

    #[serde(rename = "acquire")]
    Acquire { id: u32 },

    #[serde(rename = "set_force_copy")]
    SetForceCopy { id: u32, enabled: bool },

    #[serde(rename = "get_status")]
    GetStatus { id: u32 },

    #[serde(rename = "perform")]
    Perform { id: u32, action: MenuAction },

    // -- Pushes (daemon → surface) --
    #[serde(rename = "selection")]
    Selection { id: u32, selection: SelectionPayload },

    #[serde(rename = "dismiss")]
    Dismiss { id: u32 },

    // -- Generic response --
    #[serde(rename = "response")]
    Response {
        id: u32,
        status: Status,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selection: Option<SelectionPayload>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        daemon: Option<DaemonStatus>,
    },
}

impl Message {
    /// Bare `ok` response.
    pub fn ok(id: u32) -> Self {
        Message::Response {
            id,
            status: Status::Ok,
            error: None,
            selection: None,
            daemon: None,
        }
    }

    /// `error` response carrying a machine-readable reason.
    pub fn error(id: u32, reason: impl Into<String>) -> Self {
        Message::Response {
            id,
            status: Status::Error,
            error: Some(reason.into()),
            selection: None,
            daemon: None,
        }
    }
}

/// Peer role in the handshake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// One-shot requests.
    Client,
    /// Action dispatch surface; may subscribe to pushes.
    Surface,
}

/// Response status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// A published selection, as the dispatch surface sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionPayload {
    /// Fresh uuid per publication.
    pub selection_id: String,
    pub text: String,
    pub strategy: Strategy,
    pub app_name: String,
    #[serde(default)]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub press_location: Option<Point>,
    #[serde(default)]
    pub release_location: Option<Point>,
    pub can_copy: bool,
    pub can_cut: bool,
    pub can_paste: bool,
}

impl SelectionPayload {
    pub fn new(
        selection: Selection,
        availability: MenuAvailability,
        press_location: Option<Point>,
        release_location: Option<Point>,
    ) -> Self {
        Self {
            selection_id: uuid::Uuid::new_v4().to_string(),
            text: selection.text,
            strategy: selection.strategy,
            app_name: selection.app.name,
            bundle_id: selection.app.bundle_id,
            press_location,
            release_location,
            can_copy: availability.can_copy,
            can_cut: availability.can_cut,
            can_paste: availability.can_paste,
        }
    }
}

/// Daemon status returned in `get_status` responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonStatus {
    pub force_copy: bool,
    pub monitoring: bool,
    pub subscribers: u32,
    pub has_selection: bool,
    #[serde(default)]
    pub last_press: Option<Point>,
    #[serde(default)]
    pub last_release: Option<Point>,
}

/// Protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum payload size (16 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Minimal envelope for extracting `{type, id}` from unknown messages.
///
/// Used as a fallback when [`Message`] deserialization fails on an
/// unknown `type` tag, so the error response can echo the request `id`.
#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    pub msg_type: String,
    pub id: u32,
}
