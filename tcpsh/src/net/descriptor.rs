use crate::sys::platform::{sys_close, sys_read, sys_shutdown, sys_write};

use std::io;
use std::marker::PhantomData;
use std::net::Shutdown;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, RawFd};

/// An owned socket descriptor.
///
/// The descriptor is shut down and closed exactly once, when the value
/// is dropped. Moving it is the only way to hand ownership on.
#[derive(Debug)]
pub struct Descriptor {
    fd: RawFd,
}

impl Descriptor {
    /// Takes ownership of a raw descriptor returned by the OS.
    pub(crate) fn from_raw(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Borrows the descriptor as a readable/writable connection.
    pub fn connection(&self) -> Connection<'_> {
        Connection {
            fd: self.fd,
            _owner: PhantomData,
        }
    }
}

impl AsRawFd for Descriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl FromRawFd for Descriptor {
    /// # Safety
    ///
    /// `fd` must be an open socket that nothing else will close.
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self::from_raw(fd)
    }
}

impl IntoRawFd for Descriptor {
    fn into_raw_fd(self) -> RawFd {
        let fd = self.fd;
        std::mem::forget(self);
        fd
    }
}

impl Drop for Descriptor {
    /// Shuts the socket down in both directions, then closes it.
    fn drop(&mut self) {
        // Fails with ENOTCONN on sockets that never connected.
        let _ = sys_shutdown(self.fd, Shutdown::Both);
        sys_close(self.fd);
    }
}

/// A borrowed view of a connected descriptor.
///
/// `Connection` is what callbacks and hooks receive. It cannot outlive
/// the [`Descriptor`] it was borrowed from, and it never closes it.
///
/// Reads and writes map onto exactly one syscall each; nothing here
/// loops to fill or drain a buffer.
#[derive(Debug)]
pub struct Connection<'a> {
    fd: RawFd,
    _owner: PhantomData<&'a Descriptor>,
}

impl Connection<'_> {
    /// Returns the underlying raw descriptor.
    pub fn raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl AsRawFd for Connection<'_> {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl io::Read for Connection<'_> {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        sys_read(self.fd, buffer)
    }
}

impl io::Write for Connection<'_> {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        sys_write(self.fd, buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for &Connection<'_> {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        sys_read(self.fd, buffer)
    }
}

impl io::Write for &Connection<'_> {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        sys_write(self.fd, buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
