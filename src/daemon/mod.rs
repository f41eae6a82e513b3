//! Selection daemon — input monitoring, acquisition and the control socket.
//!
//! The daemon is the process that turns gestures into published
//! selections. It watches the device-wide input stream, runs the
//! acquisition engine when a double-click or drag-select completes, and
//! pushes the result (or a dismiss) to subscribed dispatch surfaces over
//! a Unix domain socket.
//!
//! Architecture: channel-based actor. A single daemon loop owns all
//! mutable state ([`state::DaemonState`], the input monitor, the
//! in-flight acquisition). Per-connection tasks forward requests via
//! mpsc channels; combination callbacks and finished acquisitions come
//! back to the loop the same way.

mod connection;
mod handler;
pub mod state;

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use connection::{DaemonCommand, DisconnectNotice};
use handler::{MonitorView, Reply};
use state::{ConnectionId, DaemonState};

use crate::clipboard::ClipboardManager;
use crate::config::Settings;
use crate::input::{
    DoubleClick, DragAndDrop, Handler, InputEvent, InputEventMonitor, Point, RawInputEvent, Scroll,
};
use crate::ipc::protocol::{Message, SelectionPayload, Status};
use crate::menu::MenuAvailability;
use crate::resolver::{self, InputSource, ResolverError};
use crate::selection::{EnvMirror, TextSelectionEngine, TextSelectionError};

/// Daemon startup/runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("daemon already running at {0}")]
    AlreadyRunning(PathBuf),
    #[error("failed to create directory {path}: {source}")]
    MkdirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to bind socket {path}: {source}")]
    BindFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Platform(#[from] ResolverError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the daemon until SIGTERM or SIGINT.
///
/// - Socket at [`socket_path`] (directory mode 0700)
/// - Stale socket detection and cleanup
/// - SIGTERM/SIGINT → graceful shutdown, taps released, socket removed
pub async fn run(settings: Arc<Settings>) -> Result<(), DaemonError> {
    let platform = resolver::connect()?;
    let socket_path = socket_path();
    let listener = bind_socket(&socket_path).await?;

    tracing::info!(path = %socket_path.display(), "daemon listening");

    let clipboard = Arc::new(ClipboardManager::new(Arc::clone(&platform.pasteboard)));
    let engine = Arc::new(TextSelectionEngine::new(
        Arc::clone(&platform.accessibility),
        clipboard,
        settings,
        EnvMirror::default(),
    ));
    let daemon = Daemon::new(engine, Arc::clone(&platform.input));

    let shutdown = CancellationToken::new();
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;
    let signalled = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
        }
        signalled.cancel();
    });

    daemon.serve(listener, shutdown).await;

    if let Err(e) = std::fs::remove_file(&socket_path) {
        tracing::warn!(error = %e, path = %socket_path.display(), "failed to remove socket");
    }

    tracing::info!("daemon stopped");
    Ok(())
}

/// Work the loop receives from combination callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Acquire,
    Dismiss,
}

/// A peer waiting on the outcome of an acquisition or built-in action.
struct Requester {
    id: u32,
    response_tx: oneshot::Sender<Message>,
}

impl Requester {
    fn respond(self, response: Message) {
        let _ = self.response_tx.send(response);
    }
}

/// A finished acquisition task.
struct Acquired {
    generation: u64,
    outcome: Result<SelectionPayload, TextSelectionError>,
    requester: Option<Requester>,
}

/// Receivers drained by the daemon loop.
struct Inbox {
    commands: mpsc::UnboundedReceiver<DaemonCommand>,
    disconnects: mpsc::UnboundedReceiver<DisconnectNotice>,
    events: mpsc::UnboundedReceiver<RawInputEvent>,
    triggers: mpsc::UnboundedReceiver<Trigger>,
    acquired: mpsc::UnboundedReceiver<Acquired>,
}

/// State owned by the daemon loop.
struct Core {
    engine: Arc<TextSelectionEngine>,
    monitor: InputEventMonitor,
    state: DaemonState,
    /// Per-connection push channels.
    pushes: HashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    cmd_tx: mpsc::UnboundedSender<DaemonCommand>,
    disconnect_tx: mpsc::UnboundedSender<DisconnectNotice>,
    acquired_tx: mpsc::UnboundedSender<Acquired>,
    /// Cancels the acquisition currently running, if any.
    in_flight: Option<CancellationToken>,
}

/// The assembled daemon, ready to serve a bound listener.
pub struct Daemon {
    core: Core,
    inbox: Inbox,
}

impl Daemon {
    /// Wire the input monitor's combinations to the acquisition engine.
    pub fn new(engine: Arc<TextSelectionEngine>, input: Arc<dyn InputSource>) -> Self {
        let settings = Arc::clone(engine.settings());
        let (mut monitor, events) = InputEventMonitor::new(input, settings.trigger_delay);
        let (trigger_tx, triggers) = mpsc::unbounded_channel();

        let fire = |trigger: Trigger| {
            let tx = trigger_tx.clone();
            move || {
                let _ = tx.send(trigger);
            }
        };
        monitor.add_combination(Box::new(DoubleClick::new().with_trigger(fire(Trigger::Acquire))));
        monitor.add_combination(Box::new(
            DragAndDrop::new(settings.drag_threshold).with_trigger(fire(Trigger::Acquire)),
        ));
        monitor.add_combination(Box::new(Scroll::new().with_trigger(fire(Trigger::Dismiss))));
        monitor.add_combination(Box::new(
            Handler::new("dismiss-on-input", |event| match event {
                InputEvent::PointerDown(raw) => raw.click_count < 2,
                InputEvent::PointerDragged(_) | InputEvent::KeyDown(_) => true,
                _ => false,
            })
            .with_trigger(fire(Trigger::Dismiss)),
        ));

        let (cmd_tx, commands) = mpsc::unbounded_channel();
        let (disconnect_tx, disconnects) = mpsc::unbounded_channel();
        let (acquired_tx, acquired) = mpsc::unbounded_channel();

        Self {
            core: Core {
                engine,
                monitor,
                state: DaemonState::new(),
                pushes: HashMap::new(),
                cmd_tx,
                disconnect_tx,
                acquired_tx,
                in_flight: None,
            },
            inbox: Inbox {
                commands,
                disconnects,
                events,
                triggers,
                acquired,
            },
        }
    }

    /// Serve `listener` until `shutdown` is cancelled.
    pub async fn serve(self, listener: UnixListener, shutdown: CancellationToken) {
        let Daemon {
            mut core,
            mut inbox,
        } = self;
        core.monitor.start_global_monitoring();

        loop {
            tokio::select! {
                // -- New connection --
                result = listener.accept() => match result {
                    Ok((stream, _addr)) => core.accept_connection(stream),
                    Err(e) => tracing::warn!(error = %e, "accept failed"),
                },

                // -- Request from a connection task --
                Some(cmd) = inbox.commands.recv() => core.handle_command(cmd),

                // -- Connection disconnected --
                Some(notice) = inbox.disconnects.recv() => {
                    let conn_id = notice.connection_id;
                    core.pushes.remove(&conn_id);
                    core.state.remove_connection(conn_id);
                    tracing::debug!(?conn_id, "connection cleaned up");
                }

                // -- Raw input from the taps --
                Some(raw) = inbox.events.recv() => {
                    core.monitor.handle_event(raw);
                }

                // -- Combination completed (after the settle delay) --
                Some(trigger) = inbox.triggers.recv() => match trigger {
                    Trigger::Acquire => core.start_acquisition(None),
                    Trigger::Dismiss => core.dismiss(),
                },

                // -- Acquisition finished --
                Some(done) = inbox.acquired.recv() => core.finish_acquisition(done),

                _ = shutdown.cancelled() => break,
            }
        }

        if let Some(cancel) = core.in_flight.take() {
            cancel.cancel();
        }
        core.monitor.stop_monitoring();
    }
}

impl Core {
    /// Accept a new connection: create its push channel and spawn its task.
    fn accept_connection(&mut self, stream: UnixStream) {
        let conn_id = ConnectionId::new();
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        self.pushes.insert(conn_id, push_tx);

        connection::spawn_connection(
            stream,
            conn_id,
            self.cmd_tx.clone(),
            push_rx,
            self.disconnect_tx.clone(),
        );

        tracing::debug!(?conn_id, "accepted connection");
    }

    fn handle_command(&mut self, cmd: DaemonCommand) {
        let view = MonitorView {
            monitoring: self.monitor.is_monitoring(),
            last_press: self.monitor.last_press_location(),
            last_release: self.monitor.last_release_location(),
        };
        let reply = handler::handle_message(
            &mut self.state,
            self.engine.settings(),
            view,
            cmd.request,
            cmd.connection_id,
        );
        match reply {
            Reply::Respond(response) => {
                let _ = cmd.response_tx.send(response);
            }
            Reply::Acquire { id } => self.start_acquisition(Some(Requester {
                id,
                response_tx: cmd.response_tx,
            })),
            Reply::Perform { id, action } => {
                let engine = Arc::clone(&self.engine);
                let requester = Requester {
                    id,
                    response_tx: cmd.response_tx,
                };
                tokio::spawn(async move {
                    let response = match engine.perform(action).await {
                        Ok(()) => Message::ok(requester.id),
                        Err(e) => {
                            tracing::debug!(%action, error = %e, "built-in action failed");
                            Message::error(requester.id, e.kind())
                        }
                    };
                    requester.respond(response);
                });
            }
        }
    }

    /// Cancel any running acquisition and start a new one.
    fn start_acquisition(&mut self, requester: Option<Requester>) {
        let generation = self.state.next_generation();
        let cancel = CancellationToken::new();
        if let Some(previous) = self.in_flight.replace(cancel.clone()) {
            previous.cancel();
        }

        let press = self.monitor.last_press_location();
        let release = self.monitor.last_release_location();
        let engine = Arc::clone(&self.engine);
        let acquired_tx = self.acquired_tx.clone();
        tokio::spawn(async move {
            let outcome = acquire_payload(&engine, &cancel, press, release).await;
            let _ = acquired_tx.send(Acquired {
                generation,
                outcome,
                requester,
            });
        });
    }

    fn finish_acquisition(&mut self, done: Acquired) {
        if !self.state.is_current(done.generation) {
            tracing::debug!(generation = done.generation, "stale acquisition dropped");
            if let Some(requester) = done.requester {
                let id = requester.id;
                requester.respond(Message::error(id, TextSelectionError::Cancelled.kind()));
            }
            return;
        }
        self.in_flight = None;

        match done.outcome {
            Ok(payload) => {
                self.state.publish(payload.clone());
                self.push(Message::Selection {
                    id: 0,
                    selection: payload.clone(),
                });
                if let Some(requester) = done.requester {
                    let id = requester.id;
                    requester.respond(Message::Response {
                        id,
                        status: Status::Ok,
                        error: None,
                        selection: Some(payload),
                        daemon: None,
                    });
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "acquisition failed");
                self.dismiss();
                if let Some(requester) = done.requester {
                    let id = requester.id;
                    requester.respond(Message::error(id, e.kind()));
                }
            }
        }
    }

    /// Tell subscribers to hide the current selection, if one is shown.
    fn dismiss(&mut self) {
        if self.state.dismiss() {
            self.push(Message::Dismiss { id: 0 });
        }
    }

    /// Deliver a push to every subscriber.
    fn push(&self, message: Message) {
        for conn_id in self.state.subscribers() {
            match self.pushes.get(&conn_id) {
                Some(tx) if tx.send(message.clone()).is_ok() => {}
                _ => tracing::warn!(?conn_id, "push failed, subscriber gone"),
            }
        }
    }
}

/// Acquire the selection and attach built-in action availability.
async fn acquire_payload(
    engine: &TextSelectionEngine,
    cancel: &CancellationToken,
    press: Option<Point>,
    release: Option<Point>,
) -> Result<SelectionPayload, TextSelectionError> {
    let selection = engine.acquire(cancel).await?;
    if cancel.is_cancelled() {
        return Err(TextSelectionError::Cancelled);
    }
    let availability = engine.menu_availability().await.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "menu availability unknown");
        MenuAvailability::default()
    });
    Ok(SelectionPayload::new(selection, availability, press, release))
}

// -- Socket setup --

/// Control socket path: `$XDG_RUNTIME_DIR/xpop/daemon.sock`, else
/// `$TMPDIR/xpop-<uid>/daemon.sock`.
pub fn socket_path() -> PathBuf {
    resolve_socket_path(
        std::env::var_os("XDG_RUNTIME_DIR"),
        std::env::var_os("TMPDIR"),
        nix::unistd::getuid().as_raw(),
    )
}

fn resolve_socket_path(
    runtime_dir: Option<OsString>,
    tmpdir: Option<OsString>,
    uid: u32,
) -> PathBuf {
    if let Some(dir) = runtime_dir.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir).join("xpop").join("daemon.sock");
    }
    let base = tmpdir
        .filter(|d| !d.is_empty())
        .map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
    base.join(format!("xpop-{uid}")).join("daemon.sock")
}

/// Create the socket directory and bind the Unix listener.
///
/// Handles stale socket detection: if EADDRINUSE, attempts to connect
/// to the existing socket. If the connection succeeds, another daemon
/// is running. If it fails, the socket is stale and is removed.
async fn bind_socket(path: &Path) -> Result<UnixListener, DaemonError> {
    let parent = path.parent().expect("socket path has parent");
    if !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|e| DaemonError::MkdirFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    // Enforce 0700 even when the directory already existed.
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700)).map_err(|e| {
            DaemonError::MkdirFailed {
                path: parent.to_path_buf(),
                source: e,
            }
        })?;
    }

    let bind_failed = |source| DaemonError::BindFailed {
        path: path.to_path_buf(),
        source,
    };
    match UnixListener::bind(path) {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            if UnixStream::connect(path).await.is_ok() {
                return Err(DaemonError::AlreadyRunning(path.to_path_buf()));
            }
            tracing::info!(path = %path.display(), "removing stale socket");
            std::fs::remove_file(path).map_err(bind_failed)?;
            UnixListener::bind(path).map_err(bind_failed)
        }
        Err(e) => Err(bind_failed(e)),
    }
}
