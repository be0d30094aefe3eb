use super::{ShellHandler, TcpShell};
use crate::logging::{LogFacade, Logger};
use crate::net::{DEFAULT_BACKLOG, RunFlag};

use std::sync::Arc;

/// Size of the buffer each connection is read into.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Builder for configuring and creating a [`TcpShell`].
///
/// # Examples
///
/// ```rust,ignore
/// let shell = ShellBuilder::new("127.0.0.1", 5000)
///     .buffer_size(1024)
///     .build(MyHandler::default());
/// ```
pub struct ShellBuilder {
    /// Host used in log lines. The shell always binds to `0.0.0.0`.
    host: String,

    port: u16,

    /// Bytes read per connection, in a single `read(2)`.
    buffer_size: usize,

    backlog: i32,

    logger: Arc<dyn Logger>,

    run_flag: RunFlag,
}

impl ShellBuilder {
    /// Creates a builder for a shell on `port`, with default options.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            buffer_size: DEFAULT_BUFFER_SIZE,
            backlog: DEFAULT_BACKLOG,
            logger: Arc::new(LogFacade),
            run_flag: RunFlag::new(),
        }
    }

    /// Sets the per-connection read buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn buffer_size(mut self, n: usize) -> Self {
        assert!(n > 0, "buffer_size must be > 0");

        self.buffer_size = n;
        self
    }

    /// Sets the backlog passed to `listen(2)`.
    pub fn backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Sets the sink the shell logs through.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Uses an existing flag to control the accept loop.
    ///
    /// Handlers that need to stop their own shell can keep a clone.
    pub fn run_flag(mut self, run_flag: RunFlag) -> Self {
        self.run_flag = run_flag;
        self
    }

    /// Builds the shell around `handler`.
    pub fn build<H: ShellHandler>(self, handler: H) -> TcpShell<H> {
        TcpShell::from_parts(
            self.host,
            self.port,
            self.buffer_size,
            self.backlog,
            self.logger,
            self.run_flag,
            handler,
        )
    }
}
