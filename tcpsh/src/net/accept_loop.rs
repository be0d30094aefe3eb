use super::descriptor::Descriptor;
use super::run_flag::RunFlag;
use crate::error::{SocketError, SocketResult};
use crate::logging::Logger;
use crate::sys::platform::{sys_accept, sys_bind, sys_listen, sys_set_reuse, sys_socket, sys_sockname};

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::fd::AsRawFd;

/// Backlog passed to `listen(2)`: nothing queues behind the accept in flight.
pub const DEFAULT_BACKLOG: i32 = 0;

/// The remote end of an accepted or established connection.
///
/// Only valid for the duration of the callback it is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer {
    address: SocketAddrV4,
}

impl Peer {
    pub(crate) fn new(address: SocketAddrV4) -> Self {
        Self { address }
    }

    /// Returns the peer's IPv4 address.
    pub fn host(&self) -> Ipv4Addr {
        *self.address.ip()
    }

    /// Returns the peer's port.
    pub fn port(&self) -> u16 {
        self.address.port()
    }

    /// Returns the peer's full socket address.
    pub fn address(&self) -> SocketAddrV4 {
        self.address
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.address.fmt(f)
    }
}

/// Parses a literal dotted-quad host. No name resolution is attempted.
pub(crate) fn parse_host(host: &str, port: u16) -> SocketResult<SocketAddrV4> {
    let ip: Ipv4Addr = host
        .parse()
        .map_err(|_| SocketError::InvalidAddress(host.to_string()))?;

    Ok(SocketAddrV4::new(ip, port))
}

/// Allocates a blocking stream socket with address reuse enabled.
pub(crate) fn open_socket() -> SocketResult<Descriptor> {
    let socket = Descriptor::from_raw(sys_socket().map_err(SocketError::Create)?);
    sys_set_reuse(socket.as_raw_fd()).map_err(SocketError::SetOption)?;

    Ok(socket)
}

/// Binds `socket` to `address` and starts listening.
///
/// Returns the address actually bound, which differs from `address`
/// when port `0` was requested.
pub(crate) fn listen(
    socket: &Descriptor,
    address: SocketAddrV4,
    backlog: i32,
) -> SocketResult<SocketAddrV4> {
    let fd = socket.as_raw_fd();

    sys_bind(fd, &address).map_err(|source| SocketError::Bind { address, source })?;
    sys_listen(fd, backlog).map_err(SocketError::Listen)?;

    Ok(sys_sockname(fd).unwrap_or(address))
}

/// Sequential accept loop shared by containers and shells.
///
/// Each accepted connection is handed to the handler and closed as soon
/// as the handler returns, before the next accept. Accept failures are
/// logged and skipped.
pub(crate) struct AcceptLoop<'a> {
    pub(crate) listener: &'a Descriptor,
    pub(crate) run_flag: &'a RunFlag,
    pub(crate) logger: &'a dyn Logger,
    pub(crate) tag: &'a str,
}

impl AcceptLoop<'_> {
    /// Runs until the run flag is cleared.
    pub(crate) fn run<F>(&self, mut on_connection: F)
    where
        F: FnMut(Peer, &Descriptor),
    {
        while self.run_flag.is_set() {
            let (fd, address) = match sys_accept(self.listener.as_raw_fd()) {
                Ok(accepted) => accepted,
                Err(e) => {
                    self.logger
                        .warn(self.tag, format_args!("{}", SocketError::Accept(e)));
                    continue;
                }
            };

            let connection = Descriptor::from_raw(fd);
            let peer = Peer::new(address);
            self.logger
                .info(self.tag, format_args!("New connection from '{peer}'"));

            on_connection(peer, &connection);
            drop(connection);
        }
    }
}
