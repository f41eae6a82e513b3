//! CLI client for daemon operations.
//!
//! Provides one-shot commands that connect to the daemon's control
//! socket, perform a single request, print the result, and exit.
//! `watch` stays connected as a surface and prints pushes.

mod daemon_client;
mod format;

use crate::cli::ClientAction;
use crate::daemon;
use crate::ipc::protocol::Role;
use daemon_client::DaemonClient;

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("daemon: {0}")]
    Daemon(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the client command. Called from `main.rs` for `Command::Client`.
pub async fn run(action: ClientAction) -> Result<(), ClientError> {
    let socket_path = daemon::socket_path();
    let role = match action {
        ClientAction::Watch => Role::Surface,
        _ => Role::Client,
    };
    let mut client = DaemonClient::connect(&socket_path, role).await?;

    match action {
        ClientAction::Selection => {
            let selection = client.get_selection().await?;
            format::print_selection(&selection)?;
        }
        ClientAction::Acquire => {
            let selection = client.acquire().await?;
            format::print_selection(&selection)?;
        }
        ClientAction::Watch => {
            client.subscribe().await?;
            while let Some(push) = client.next_push().await? {
                format::print_push(&push);
            }
        }
        ClientAction::ForceCopy { state } => {
            client.set_force_copy(state.enabled()).await?;
            format::print_force_copy(state.enabled());
        }
        ClientAction::Status => {
            let status = client.get_status().await?;
            format::print_status(&status);
        }
        ClientAction::Perform { action } => {
            client.perform(action).await?;
            format::print_performed(action);
        }
    }

    Ok(())
}
