//! IPC codec and wire protocol for the daemon control socket.

pub mod codec;
pub mod protocol;
