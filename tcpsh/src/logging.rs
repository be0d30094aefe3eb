//! Logging sink injected into containers and shells.
//!
//! Components never reach for a global logger directly. Each one holds
//! an `Arc<dyn Logger>` handed to it at construction. The default,
//! [`LogFacade`], forwards to the [`log`] crate with the component tag as
//! the log target, so any `log` backend (such as `env_logger`) picks the
//! lines up.

use std::fmt;

pub use log::Level;

/// A sink for diagnostic lines.
///
/// Implementations must not fail; the caller never inspects the outcome
/// of a log call.
pub trait Logger: Send + Sync {
    /// Emits one line at `level`, attributed to `tag`.
    fn log(&self, level: Level, tag: &str, message: fmt::Arguments<'_>);

    fn debug(&self, tag: &str, message: fmt::Arguments<'_>) {
        self.log(Level::Debug, tag, message);
    }

    fn info(&self, tag: &str, message: fmt::Arguments<'_>) {
        self.log(Level::Info, tag, message);
    }

    fn warn(&self, tag: &str, message: fmt::Arguments<'_>) {
        self.log(Level::Warn, tag, message);
    }

    fn error(&self, tag: &str, message: fmt::Arguments<'_>) {
        self.log(Level::Error, tag, message);
    }
}

/// Forwards every line to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn log(&self, level: Level, tag: &str, message: fmt::Arguments<'_>) {
        log::log!(target: tag, level, "{}", message);
    }
}

/// Discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _tag: &str, _message: fmt::Arguments<'_>) {}
}
