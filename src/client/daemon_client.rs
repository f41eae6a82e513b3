//! Control-socket client for the CLI.
//!
//! Connects to the daemon, performs the handshake, and provides one
//! method per request. Each CLI invocation performs a single
//! request-response cycle, except `watch`, which then reads pushes.

use std::path::Path;

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

use crate::ipc::codec::LengthPrefixedCodec;
use crate::ipc::protocol::{
    DaemonStatus, Message, PROTOCOL_VERSION, Role, SelectionPayload, Status,
};
use crate::menu::MenuAction;

use super::ClientError;

pub struct DaemonClient {
    framed: Framed<UnixStream, LengthPrefixedCodec>,
    next_id: u32,
}

impl DaemonClient {
    /// Connect to the daemon at `socket_path` and perform the handshake.
    pub async fn connect(socket_path: &Path, role: Role) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(socket_path).await.map_err(|e| {
            ClientError::Daemon(format!("connect {}: {e}", socket_path.display()))
        })?;
        let mut framed = Framed::new(stream, LengthPrefixedCodec::new());

        framed
            .send(Message::Hello {
                id: 0,
                version: PROTOCOL_VERSION,
                role,
            })
            .await
            .map_err(|e| ClientError::Daemon(format!("send hello: {e}")))?;

        match framed.next().await {
            Some(Ok(Message::HelloAck {
                status: Status::Ok, ..
            })) => {}
            Some(Ok(Message::HelloAck {
                status: Status::Error,
                error,
                ..
            })) => {
                return Err(ClientError::Daemon(format!(
                    "handshake rejected: {}",
                    error.unwrap_or_default()
                )));
            }
            other => {
                return Err(ClientError::Daemon(format!(
                    "unexpected handshake response: {other:?}"
                )));
            }
        }

        Ok(Self {
            framed,
            next_id: 1, // 0 = Hello
        })
    }

    /// The last selection the daemon published.
    pub async fn get_selection(&mut self) -> Result<SelectionPayload, ClientError> {
        let response = self
            .request("get_selection", |id| Message::GetSelection { id })
            .await?;
        expect_selection("get_selection", response)
    }

    /// Run an acquisition now.
    pub async fn acquire(&mut self) -> Result<SelectionPayload, ClientError> {
        let response = self.request("acquire", |id| Message::Acquire { id }).await?;
        expect_selection("acquire", response)
    }

    pub async fn set_force_copy(&mut self, enabled: bool) -> Result<(), ClientError> {
        self.request("set_force_copy", |id| Message::SetForceCopy { id, enabled })
            .await
            .map(drop)
    }

    pub async fn get_status(&mut self) -> Result<DaemonStatus, ClientError> {
        match self.request("get_status", |id| Message::GetStatus { id }).await? {
            Message::Response {
                daemon: Some(status),
                ..
            } => Ok(status),
            other => Err(ClientError::Daemon(format!(
                "unexpected get_status response: {other:?}"
            ))),
        }
    }

    /// Press a built-in menu item in the frontmost application.
    pub async fn perform(&mut self, action: MenuAction) -> Result<(), ClientError> {
        self.request("perform", |id| Message::Perform { id, action })
            .await
            .map(drop)
    }

    /// Subscribe to pushes. Requires the surface role.
    pub async fn subscribe(&mut self) -> Result<(), ClientError> {
        self.request("subscribe", |id| Message::Subscribe { id })
            .await
            .map(drop)
    }

    /// Next push after [`subscribe`](Self::subscribe); `None` once the
    /// daemon closes the connection.
    pub async fn next_push(&mut self) -> Result<Option<Message>, ClientError> {
        match self.framed.next().await {
            Some(Ok(msg)) => Ok(Some(msg)),
            Some(Err(e)) => Err(ClientError::Daemon(format!("read push: {e}"))),
            None => Ok(None),
        }
    }

    /// Send one request and return its `ok` response.
    async fn request(
        &mut self,
        op: &str,
        build: impl FnOnce(u32) -> Message,
    ) -> Result<Message, ClientError> {
        let id = self.next_id;
        self.next_id += 1;

        self.framed
            .send(build(id))
            .await
            .map_err(|e| ClientError::Daemon(format!("send {op}: {e}")))?;

        match self.framed.next().await {
            Some(Ok(
                response @ Message::Response {
                    status: Status::Ok, ..
                },
            )) => Ok(response),
            Some(Ok(Message::Response { error, .. })) => Err(ClientError::Daemon(format!(
                "{op} failed: {}",
                error.unwrap_or_default()
            ))),
            other => Err(ClientError::Daemon(format!(
                "unexpected {op} response: {other:?}"
            ))),
        }
    }
}

fn expect_selection(op: &str, response: Message) -> Result<SelectionPayload, ClientError> {
    match response {
        Message::Response {
            selection: Some(selection),
            ..
        } => Ok(selection),
        other => Err(ClientError::Daemon(format!(
            "unexpected {op} response: {other:?}"
        ))),
    }
}
