use libc::{
    AF_INET, SHUT_RD, SHUT_RDWR, SHUT_WR, SO_REUSEADDR, SO_REUSEPORT, SOCK_STREAM, SOL_SOCKET,
    accept, bind, c_int, close, connect, getsockname, listen, read, setsockopt, shutdown, sockaddr,
    sockaddr_in, socket, socklen_t, write,
};
use std::net::{Ipv4Addr, Shutdown, SocketAddrV4};
use std::os::fd::RawFd;
use std::{io, mem};

/// Creates a blocking IPv4 stream socket.
pub(crate) fn sys_socket() -> io::Result<RawFd> {
    let fd = unsafe { socket(AF_INET, SOCK_STREAM, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(fd)
}

/// Enables `SO_REUSEADDR` and `SO_REUSEPORT` on a socket.
pub(crate) fn sys_set_reuse(fd: RawFd) -> io::Result<()> {
    sys_set_flag(fd, SO_REUSEADDR)?;
    sys_set_flag(fd, SO_REUSEPORT)
}

fn sys_set_flag(fd: RawFd, option: c_int) -> io::Result<()> {
    let yes: c_int = 1;
    let rc = unsafe {
        setsockopt(
            fd,
            SOL_SOCKET,
            option,
            &yes as *const _ as *const _,
            mem::size_of::<c_int>() as socklen_t,
        )
    };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Binds a socket to an IPv4 address.
pub(crate) fn sys_bind(fd: RawFd, addr: &SocketAddrV4) -> io::Result<()> {
    let (storage, len) = socketaddr_to_sockaddr_in(addr);

    let rc = unsafe { bind(fd, &storage as *const _ as *const sockaddr, len) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Marks a socket as a listening socket with the given backlog.
pub(crate) fn sys_listen(fd: RawFd, backlog: c_int) -> io::Result<()> {
    let rc = unsafe { listen(fd, backlog) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Blocks until a connection arrives on a listening socket.
pub(crate) fn sys_accept(fd: RawFd) -> io::Result<(RawFd, SocketAddrV4)> {
    let mut storage: sockaddr_in = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_in>() as socklen_t;

    let client_fd = unsafe { accept(fd, &mut storage as *mut _ as *mut sockaddr, &mut len) };
    if client_fd < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok((client_fd, sockaddr_in_to_socketaddr(&storage)))
}

/// Connects a socket, blocking until the handshake completes or fails.
pub(crate) fn sys_connect(fd: RawFd, addr: &SocketAddrV4) -> io::Result<()> {
    let (storage, len) = socketaddr_to_sockaddr_in(addr);

    let rc = unsafe { connect(fd, &storage as *const _ as *const sockaddr, len) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Returns the local address of a socket.
pub(crate) fn sys_sockname(fd: RawFd) -> io::Result<SocketAddrV4> {
    let mut storage: sockaddr_in = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_in>() as socklen_t;

    let rc = unsafe { getsockname(fd, &mut storage as *mut _ as *mut sockaddr, &mut len) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(sockaddr_in_to_socketaddr(&storage))
    }
}

/// Performs a single `read(2)` into the buffer.
pub(crate) fn sys_read(fd: RawFd, buffer: &mut [u8]) -> io::Result<usize> {
    let n = unsafe { read(fd, buffer.as_mut_ptr() as *mut _, buffer.len()) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

/// Performs a single `write(2)` from the buffer.
///
/// The returned count may be smaller than `buffer.len()`.
pub(crate) fn sys_write(fd: RawFd, buffer: &[u8]) -> io::Result<usize> {
    let n = unsafe { write(fd, buffer.as_ptr() as *const _, buffer.len()) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

/// Shuts down a socket.
pub(crate) fn sys_shutdown(fd: RawFd, how: Shutdown) -> io::Result<()> {
    let how = match how {
        Shutdown::Read => SHUT_RD,
        Shutdown::Write => SHUT_WR,
        Shutdown::Both => SHUT_RDWR,
    };

    let rc = unsafe { shutdown(fd, how) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Closes a file descriptor.
pub(crate) fn sys_close(fd: RawFd) {
    unsafe { close(fd) };
}

/// Converts a `sockaddr_in` to a Rust `SocketAddrV4`.
pub(crate) fn sockaddr_in_to_socketaddr(addr: &sockaddr_in) -> SocketAddrV4 {
    let ip = Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr));
    let port = u16::from_be(addr.sin_port);

    SocketAddrV4::new(ip, port)
}

/// Converts a `SocketAddrV4` to a `sockaddr_in`.
pub(crate) fn socketaddr_to_sockaddr_in(addr: &SocketAddrV4) -> (sockaddr_in, socklen_t) {
    let mut storage: sockaddr_in = unsafe { mem::zeroed() };
    storage.sin_family = AF_INET as _;
    storage.sin_port = addr.port().to_be();
    storage.sin_addr.s_addr = u32::from(*addr.ip()).to_be();

    (storage, mem::size_of::<sockaddr_in>() as socklen_t)
}
