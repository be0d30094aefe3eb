//! Typed single-read shell.
//!
//! A [`TcpShell`] listens on a port, reads one fixed-size buffer from
//! every accepted connection, turns it into a typed value through its
//! [`ShellHandler`], and forwards the value to the handler's
//! `process` hook. Connections are served strictly one after another.
//!
//! - [`ShellBuilder`]: configuration (buffer size, backlog, logger, run flag),
//! - [`ShellHandler`]: the four lifecycle and data hooks,
//! - [`Received`] / [`FromBuffer`]: raw-buffer plumbing for `parse`.

mod builder;
mod handler;

pub use builder::{DEFAULT_BUFFER_SIZE, ShellBuilder};
pub use handler::{FromBuffer, Received, ShellHandler};

use crate::error::{SocketError, SocketResult};
use crate::logging::Logger;
use crate::net::accept_loop::{self, AcceptLoop};
use crate::net::{Descriptor, RunFlag};

use std::io::Read;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

const TAG: &str = "TCPShell";

/// A blocking server that parses one read per connection.
///
/// # Examples
///
/// ```rust,ignore
/// let mut shell = TcpShell::new("127.0.0.1", 5000, Printer);
/// shell.start()?;
/// ```
pub struct TcpShell<H: ShellHandler> {
    host: String,
    port: u16,
    buffer_size: usize,
    backlog: i32,
    logger: Arc<dyn Logger>,
    run_flag: RunFlag,
    /// `0` while not listening.
    local_port: Arc<AtomicU16>,
    exit_reason: Option<String>,
    handler: H,
}

impl<H: ShellHandler> TcpShell<H> {
    /// Creates a shell with default options. See [`ShellBuilder`].
    pub fn new(host: impl Into<String>, port: u16, handler: H) -> Self {
        ShellBuilder::new(host, port).build(handler)
    }

    pub(crate) fn from_parts(
        host: String,
        port: u16,
        buffer_size: usize,
        backlog: i32,
        logger: Arc<dyn Logger>,
        run_flag: RunFlag,
        handler: H,
    ) -> Self {
        Self {
            host,
            port,
            buffer_size,
            backlog,
            logger,
            run_flag,
            local_port: Arc::new(AtomicU16::new(0)),
            exit_reason: None,
            handler,
        }
    }

    /// Runs the full lifecycle: `on_start`, [`run`](Self::run), `on_stop`.
    ///
    /// `on_stop` runs even when setup fails.
    pub fn start(&mut self) -> SocketResult<()> {
        self.handler.on_start();
        let result = self.run();
        self.handler.on_stop();

        result
    }

    /// Sets up the listener on `0.0.0.0:port` and serves connections
    /// until the run flag is cleared.
    ///
    /// For each accepted connection the shell performs exactly one read
    /// into a zeroed buffer. A read of zero bytes (peer closed) or a
    /// failed read skips `parse` and `process`. The connection is closed
    /// before the next accept.
    ///
    /// # Errors
    ///
    /// Returns the setup failure (socket, options, bind, listen); the
    /// accept loop is not entered in that case.
    pub fn run(&mut self) -> SocketResult<()> {
        self.logger.info(TAG, format_args!("Starting"));

        let (socket, bound) = match self.setup() {
            Ok(listener) => listener,
            Err(e) => return Err(self.fail(e)),
        };

        self.run_flag.set();
        self.local_port.store(bound.port(), Ordering::Release);
        self.logger.info(
            TAG,
            format_args!(
                "Listening on '{}:{}' for connections...",
                self.host,
                bound.port()
            ),
        );

        let logger = Arc::clone(&self.logger);
        let run_flag = self.run_flag.clone();
        let mut buffer = vec![0u8; self.buffer_size];

        AcceptLoop {
            listener: &socket,
            run_flag: &run_flag,
            logger: logger.as_ref(),
            tag: TAG,
        }
        .run(|peer, connection| {
            buffer.fill(0);

            match connection.connection().read(&mut buffer) {
                Ok(0) => {
                    logger.debug(TAG, format_args!("'{peer}' closed without sending data"));
                }
                Ok(n) => {
                    logger.debug(
                        TAG,
                        format_args!("Read {n} bytes from '{peer}'. Processing."),
                    );

                    let value = self.handler.parse(&Received::new(&buffer, n));
                    self.handler.process(value);
                }
                Err(e) => {
                    logger.warn(TAG, format_args!("Could not read from '{peer}': {e}"));
                }
            }
        });

        self.local_port.store(0, Ordering::Release);
        self.logger.info(TAG, format_args!("Stopped"));

        Ok(())
    }

    /// Returns a cloneable handle for observing or stopping this shell.
    pub fn handle(&self) -> ShellHandle {
        ShellHandle {
            run_flag: self.run_flag.clone(),
            local_port: Arc::clone(&self.local_port),
        }
    }

    /// Returns the reason of the first terminal failure, if any.
    pub fn exit_reason(&self) -> Option<&str> {
        self.exit_reason.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    fn setup(&self) -> SocketResult<(Descriptor, SocketAddrV4)> {
        let socket = accept_loop::open_socket()?;
        let bound = accept_loop::listen(
            &socket,
            SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port),
            self.backlog,
        )?;

        Ok((socket, bound))
    }

    /// Logs a terminal failure and keeps the first reason.
    fn fail(&mut self, error: SocketError) -> SocketError {
        self.logger.error(TAG, format_args!("{error}"));

        if self.exit_reason.is_none() {
            self.exit_reason = Some(error.to_string());
        }

        error
    }
}

/// Cloneable view of a [`TcpShell`], safe to move to other threads.
#[derive(Debug, Clone)]
pub struct ShellHandle {
    run_flag: RunFlag,
    local_port: Arc<AtomicU16>,
}

impl ShellHandle {
    /// Requests that the accept loop end after the current connection.
    pub fn stop(&self) {
        self.run_flag.stop();
    }

    /// Returns `true` while the accept loop may keep running.
    pub fn is_running(&self) -> bool {
        self.run_flag.is_set()
    }

    /// Returns the bound port while the shell is listening.
    pub fn local_port(&self) -> Option<u16> {
        match self.local_port.load(Ordering::Acquire) {
            0 => None,
            port => Some(port),
        }
    }
}
