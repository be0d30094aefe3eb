//! Descriptor ownership and the shared accept loop.
//!
//! This module provides the pieces both [`SocketContainer`] and
//! [`TcpShell`] are built from:
//! - [`Descriptor`] and [`Connection`]: owned and borrowed socket handles,
//! - [`RunFlag`]: the cancellation flag checked between accepts,
//! - [`Peer`]: the remote endpoint handed to callbacks,
//! - the sequential accept loop itself (crate-internal).
//!
//! [`SocketContainer`]: crate::container::SocketContainer
//! [`TcpShell`]: crate::shell::TcpShell

pub(crate) mod accept_loop;
mod descriptor;
mod run_flag;

pub use accept_loop::{DEFAULT_BACKLOG, Peer};
pub use descriptor::{Connection, Descriptor};
pub use run_flag::RunFlag;
