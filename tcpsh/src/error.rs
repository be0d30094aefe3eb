//! Error types for socket containers and shells.
//!
//! Every terminal failure is returned as a [`SocketError`]. The
//! component that produced it also keeps the error's display string as
//! its exit reason, so a caller that only holds the component can still
//! find out why the last call ended.

use crate::container::ConnectionState;

use std::io;
use std::net::SocketAddrV4;
use thiserror::Error;

/// Result type alias for socket operations.
pub type SocketResult<T> = Result<T, SocketError>;

/// Broad failure category of a [`SocketError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Descriptor creation, socket options, bind or listen failed.
    Setup,
    /// An outbound connect attempt failed.
    Connect,
    /// A single accept inside a running loop failed.
    Accept,
}

/// Errors raised while setting up or driving a socket.
#[derive(Error, Debug)]
pub enum SocketError {
    /// The OS refused to allocate a socket descriptor.
    #[error("Creation failed: {0}")]
    Create(#[source] io::Error),

    /// Enabling address reuse on the descriptor failed.
    #[error("SetSockOpt failed: {0}")]
    SetOption(#[source] io::Error),

    /// Binding to the local address failed.
    #[error("Could not bind to '{address}': {source}")]
    Bind {
        address: SocketAddrV4,
        #[source]
        source: io::Error,
    },

    /// Turning the bound socket into a listener failed.
    #[error("Could not listen: {0}")]
    Listen(#[source] io::Error),

    /// The host is not a literal dotted-quad IPv4 address.
    #[error("Invalid IPv4 address: '{0}'")]
    InvalidAddress(String),

    /// The container was used before `create` succeeded.
    #[error("Socket was not created")]
    NotCreated,

    /// The container already serves a role.
    #[error("Socket is busy ({0})")]
    InvalidState(ConnectionState),

    /// Connecting to the peer failed.
    #[error("Could not connect to '{address}': {source}")]
    Connect {
        address: SocketAddrV4,
        #[source]
        source: io::Error,
    },

    /// Accepting a single connection failed.
    #[error("Could not accept connection: {0}")]
    Accept(#[source] io::Error),
}

impl SocketError {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            SocketError::Connect { .. } => FailureKind::Connect,
            SocketError::Accept(_) => FailureKind::Accept,
            _ => FailureKind::Setup,
        }
    }
}
