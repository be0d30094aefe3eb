use crate::net::RunFlag;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU16, Ordering};

/// Role a [`SocketContainer`](super::SocketContainer) currently plays.
///
/// A listener moves `None -> Listening` and back to `None` when its loop
/// ends. A client moves `None -> Connecting -> Connected`, or back to
/// `None` if the connect fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ConnectionState {
    #[default]
    None = 0,
    Listening,
    Connecting,
    Connected,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Listening,
            2 => ConnectionState::Connecting,
            3 => ConnectionState::Connected,
            _ => ConnectionState::None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::None => "none",
            ConnectionState::Listening => "listening",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct Status {
    state: AtomicU8,
    /// `0` while not listening.
    local_port: AtomicU16,
}

/// Cloneable view of a container, safe to move to other threads.
///
/// Callbacks receive one so they can stop the loop that invoked them.
#[derive(Debug, Clone, Default)]
pub struct ContainerHandle {
    run_flag: RunFlag,
    status: Arc<Status>,
}

impl ContainerHandle {
    /// Requests that the accept loop end after the current connection.
    pub fn stop(&self) {
        self.run_flag.stop();
    }

    /// Returns `true` while the container's run flag is set.
    pub fn is_running(&self) -> bool {
        self.run_flag.is_set()
    }

    /// Returns the container's current state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.status.state.load(Ordering::Acquire))
    }

    /// Returns the bound port while the container is listening.
    pub fn local_port(&self) -> Option<u16> {
        match self.status.local_port.load(Ordering::Acquire) {
            0 => None,
            port => Some(port),
        }
    }

    pub(crate) fn run_flag(&self) -> &RunFlag {
        &self.run_flag
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        self.status.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn set_local_port(&self, port: u16) {
        self.status.local_port.store(port, Ordering::Release);
    }
}
