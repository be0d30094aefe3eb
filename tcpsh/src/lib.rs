//! # tcpsh
//!
//! **tcpsh** is a small blocking TCP library built directly on the OS
//! socket calls. It offers two independent components:
//!
//! - [`SocketContainer`]: owns one socket and either runs an accept loop
//!   that hands each peer to a callback, or connects once and hands the
//!   connection to a callback,
//! - [`TcpShell`]: listens on a port, performs one fixed-size read per
//!   connection, parses the bytes into a typed value and forwards it to
//!   a processing hook.
//!
//! Both serve one connection at a time on the calling thread. Nothing in
//! this crate spawns threads; run several components concurrently by
//! putting each on its own thread. Only literal IPv4 addresses are
//! accepted.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::io::Read;
//! use std::thread;
//! use tcpsh::SocketContainer;
//!
//! let server = thread::spawn(|| {
//!     let mut container = SocketContainer::new();
//!     container.create()?;
//!     container.listen_on(6666, |peer, connection, handle| {
//!         let mut data = Vec::new();
//!         connection.read_to_end(&mut data).ok();
//!         println!("{peer} sent {data:?}");
//!         handle.stop();
//!     })
//! });
//!
//! let mut client = SocketContainer::new();
//! client.create()?;
//! client.connect_to("127.0.0.1", 6666, |_, connection, _| {
//!     SocketContainer::write_to(connection, b"42\n").ok();
//! })?;
//! ```
//!
//! ## Modules
//!
//! - [`container`] — the raw socket container
//! - [`shell`] — the typed single-read shell
//! - [`net`] — descriptors, connections, peers and the run flag
//! - [`logging`] — the injected logging sink
//! - [`error`] — error types

mod sys;

pub mod container;
pub mod error;
pub mod logging;
pub mod net;
pub mod shell;

pub use container::{ConnectionState, ContainerHandle, SocketContainer};
pub use error::{FailureKind, SocketError, SocketResult};
pub use logging::{Level, LogFacade, Logger, NullLogger};
pub use net::{Connection, Descriptor, Peer, RunFlag};
pub use shell::{FromBuffer, Received, ShellBuilder, ShellHandle, ShellHandler, TcpShell};
