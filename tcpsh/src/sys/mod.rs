//! Platform socket primitives.
//!
//! Every socket operation the crate performs goes through the thin
//! syscall wrappers in this module. They translate negative return
//! codes into [`std::io::Error`] and never retry.
//!
//! Only unix targets are supported.

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
pub(crate) use unix as platform;
