//! Raw socket container.
//!
//! A [`SocketContainer`] owns one socket descriptor and plays exactly one
//! role: it either listens and hands every accepted peer to a callback,
//! or connects once and hands the established connection to a callback.
//!
//! All calls block the calling thread. Run several containers
//! concurrently by giving each its own thread.

mod state;

pub use state::{ConnectionState, ContainerHandle};

use crate::error::{SocketError, SocketResult};
use crate::logging::{LogFacade, Logger};
use crate::net::accept_loop::{self, AcceptLoop};
use crate::net::{Connection, DEFAULT_BACKLOG, Descriptor, Peer};
use crate::sys::platform::sys_connect;

use std::io::{self, Write};
use std::net::SocketAddrV4;
use std::os::fd::AsRawFd;
use std::sync::Arc;

const TAG: &str = "SocketContainer";

/// Host `listen_on` binds to when none is given.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Owner of a single socket descriptor.
///
/// # Examples
///
/// ```rust,ignore
/// use std::io::Read;
/// use tcpsh::SocketContainer;
///
/// let mut server = SocketContainer::new();
/// server.create()?;
/// server.listen_on(6666, |peer, connection, handle| {
///     let mut line = String::new();
///     connection.read_to_string(&mut line).ok();
///     println!("{peer}: {line}");
///     handle.stop();
/// })?;
/// ```
pub struct SocketContainer {
    socket: Option<Descriptor>,
    handle: ContainerHandle,
    /// Role taken by the current descriptor; outlives the listen loop.
    role: Option<ConnectionState>,
    exit_reason: Option<String>,
    logger: Arc<dyn Logger>,
}

impl SocketContainer {
    /// Creates a container that logs through the `log` crate.
    pub fn new() -> Self {
        Self::with_logger(Arc::new(LogFacade))
    }

    /// Creates a container that logs through `logger`.
    pub fn with_logger(logger: Arc<dyn Logger>) -> Self {
        Self {
            socket: None,
            handle: ContainerHandle::default(),
            role: None,
            exit_reason: None,
            logger,
        }
    }

    /// Allocates the stream socket and enables address reuse.
    ///
    /// On success the run flag is set.
    pub fn create(&mut self) -> SocketResult<()> {
        if let Err(e) = self.ensure_idle() {
            return Err(self.fail(e));
        }

        match accept_loop::open_socket() {
            Ok(socket) => {
                self.socket = Some(socket);
                self.handle.run_flag().set();
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Listens on `127.0.0.1:port`. See [`listen_on_host`](Self::listen_on_host).
    pub fn listen_on<F>(&mut self, port: u16, callback: F) -> SocketResult<()>
    where
        F: FnMut(&Peer, &mut Connection<'_>, &ContainerHandle),
    {
        self.listen_on_host(DEFAULT_HOST, port, callback)
    }

    /// Binds to `host:port`, listens, and runs the accept loop.
    ///
    /// Every accepted peer is handed to `callback`, one at a time; the
    /// connection is closed once the callback returns. The call blocks
    /// until the run flag is cleared, after which the state returns to
    /// [`ConnectionState::None`].
    ///
    /// # Errors
    ///
    /// Setup failures (invalid host, bind, listen) end the call before
    /// the loop starts. Accept failures are logged and never returned.
    pub fn listen_on_host<F>(&mut self, host: &str, port: u16, mut callback: F) -> SocketResult<()>
    where
        F: FnMut(&Peer, &mut Connection<'_>, &ContainerHandle),
    {
        let bound = match self.setup_listener(host, port) {
            Ok(bound) => bound,
            Err(e) => return Err(self.fail(e)),
        };

        self.role = Some(ConnectionState::Listening);
        let handle = self.handle.clone();
        handle.set_local_port(bound.port());
        handle.set_state(ConnectionState::Listening);
        self.logger
            .info(TAG, format_args!("Listening on '{bound}'"));

        if let Some(socket) = self.socket.as_ref() {
            AcceptLoop {
                listener: socket,
                run_flag: handle.run_flag(),
                logger: self.logger.as_ref(),
                tag: TAG,
            }
            .run(|peer, connection| callback(&peer, &mut connection.connection(), &handle));
        }

        handle.set_local_port(0);
        handle.set_state(ConnectionState::None);

        Ok(())
    }

    /// Connects to `host:port`. See [`connect_addr`](Self::connect_addr).
    pub fn connect_to<F>(&mut self, host: &str, port: u16, callback: F) -> SocketResult<()>
    where
        F: FnOnce(&Peer, &mut Connection<'_>, &ContainerHandle),
    {
        match accept_loop::parse_host(host, port) {
            Ok(address) => self.connect_addr(address, callback),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Makes a single connect attempt to `address`.
    ///
    /// On success `callback` runs exactly once with the container's own
    /// descriptor, which stays open afterwards; see
    /// [`connection`](Self::connection).
    ///
    /// # Errors
    ///
    /// A failed connect moves the state back to
    /// [`ConnectionState::None`]. There is no retry.
    pub fn connect_addr<F>(&mut self, address: SocketAddrV4, callback: F) -> SocketResult<()>
    where
        F: FnOnce(&Peer, &mut Connection<'_>, &ContainerHandle),
    {
        if let Err(e) = self.ensure_idle() {
            return Err(self.fail(e));
        }

        let fd = match self.socket.as_ref() {
            Some(socket) => socket.as_raw_fd(),
            None => return Err(self.fail(SocketError::NotCreated)),
        };

        self.handle.set_state(ConnectionState::Connecting);
        if let Err(source) = sys_connect(fd, &address) {
            self.handle.set_state(ConnectionState::None);
            return Err(self.fail(SocketError::Connect { address, source }));
        }
        self.handle.set_state(ConnectionState::Connected);
        self.role = Some(ConnectionState::Connected);
        self.logger
            .info(TAG, format_args!("Connected to '{address}'"));

        if let Some(socket) = self.socket.as_ref() {
            callback(&Peer::new(address), &mut socket.connection(), &self.handle);
        }

        Ok(())
    }

    /// Returns the established connection after a successful connect.
    pub fn connection(&self) -> Option<Connection<'_>> {
        if self.state() != ConnectionState::Connected {
            return None;
        }

        self.socket.as_ref().map(Descriptor::connection)
    }

    /// Closes the container's descriptor and clears the run flag.
    ///
    /// Afterwards the container may be created again for a new role.
    pub fn close(&mut self) {
        self.handle.run_flag().stop();
        if let Some(socket) = self.socket.take() {
            Self::close_socket(socket);
        }
        self.role = None;
        self.handle.set_state(ConnectionState::None);
    }

    /// Requests that the accept loop end after the current connection.
    pub fn stop(&self) {
        self.handle.stop();
    }

    /// Returns a cloneable handle for observing or stopping this container.
    pub fn handle(&self) -> ContainerHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.handle.state()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Returns the reason of the first terminal failure, if any.
    pub fn exit_reason(&self) -> Option<&str> {
        self.exit_reason.as_deref()
    }

    /// Shuts down and closes a descriptor.
    ///
    /// Taking ownership rules out a second close through the same
    /// `Descriptor`. Wrapping one raw fd twice with
    /// [`FromRawFd`](std::os::fd::FromRawFd) is the caller's mistake to avoid.
    pub fn close_socket(descriptor: Descriptor) {
        drop(descriptor);
    }

    /// Issues exactly one `write(2)` of `data`.
    ///
    /// The kernel may accept fewer bytes than offered; the returned count
    /// says how many were taken and nothing retries the remainder.
    pub fn write_to(mut connection: &Connection<'_>, data: &[u8]) -> io::Result<usize> {
        connection.write(data)
    }

    fn setup_listener(&self, host: &str, port: u16) -> SocketResult<SocketAddrV4> {
        self.ensure_idle()?;

        let address = accept_loop::parse_host(host, port)?;
        let socket = self.socket.as_ref().ok_or(SocketError::NotCreated)?;

        accept_loop::listen(socket, address, DEFAULT_BACKLOG)
    }

    /// A container serves one role per descriptor, even after its
    /// listen loop has returned to `None`.
    fn ensure_idle(&self) -> SocketResult<()> {
        match (self.state(), self.role) {
            (ConnectionState::None, None) => Ok(()),
            (ConnectionState::None, Some(role)) => Err(SocketError::InvalidState(role)),
            (busy, _) => Err(SocketError::InvalidState(busy)),
        }
    }

    /// Logs a terminal failure, keeps the first reason, clears the run flag.
    fn fail(&mut self, error: SocketError) -> SocketError {
        self.logger.error(TAG, format_args!("{error}"));

        if self.exit_reason.is_none() {
            self.exit_reason = Some(error.to_string());
        }
        self.handle.run_flag().stop();

        error
    }
}

impl Default for SocketContainer {
    fn default() -> Self {
        Self::new()
    }
}
