//! Ownership-safe socket primitive
//!
//! Thin wrapper over an OS socket descriptor. The descriptor is owned
//! exclusively by the `Socket` that created it and closed exactly once,
//! on drop. Listener constructors set `SO_REUSEADDR` so a daemon restart
//! does not fail on "address in use", and put the socket in non-blocking
//! mode so `accept` and reads never stall a caller that polled first.
//!
//! Readiness polling (`wait_readable`/`wait_writable`) is the
//! synchronization primitive the receive threads are built on: a bounded
//! `poll(2)` on the descriptor, `None` meaning block indefinitely.

use socket2::{Domain, Protocol, SockAddr, Socket as SysSocket, Type};
use std::io::{self, Read as _, Write as _};
use std::net::{Ipv4Addr, SocketAddr};
use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;

/// An OS socket owned by this process.
///
/// The descriptor is released when the value is dropped; there is no
/// separate close call to forget or to call twice.
#[derive(Debug)]
pub struct Socket {
    inner: SysSocket,
}

impl Socket {
    /// Allocate a TCP socket.
    pub fn tcp() -> io::Result<Self> {
        let inner = SysSocket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
        Ok(Self { inner })
    }

    /// Allocate a UDP socket.
    pub fn udp() -> io::Result<Self> {
        let inner = SysSocket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        Ok(Self { inner })
    }

    /// Create a TCP listener bound to the wildcard address.
    ///
    /// Any step failing drops the partially-created socket, so no
    /// descriptor survives a failed call.
    pub fn tcp_listener(port: u16, backlog: i32) -> io::Result<Self> {
        let socket = Self::tcp()?;
        socket.inner.set_reuse_address(true)?;
        socket.inner.bind(&wildcard(port))?;
        socket.inner.listen(backlog)?;
        socket.inner.set_nonblocking(true)?;
        Ok(socket)
    }

    /// Create a UDP listener bound to the wildcard address.
    ///
    /// Bind only; datagram sockets have no listen state.
    pub fn udp_listener(port: u16) -> io::Result<Self> {
        let socket = Self::udp()?;
        socket.inner.set_reuse_address(true)?;
        socket.inner.bind(&wildcard(port))?;
        socket.inner.set_nonblocking(true)?;
        Ok(socket)
    }

    /// Accept a pending connection without blocking.
    ///
    /// Returns `Ok(None)` when no connection is pending.
    pub fn accept(&self) -> io::Result<Option<Socket>> {
        match self.inner.accept() {
            Ok((peer, _addr)) => Ok(Some(Socket { inner: peer })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read into `buffer`, returning the number of bytes transferred.
    ///
    /// On a datagram socket this consumes one datagram, truncated to the
    /// buffer length.
    pub fn read(&self, buffer: &mut [u8]) -> io::Result<usize> {
        (&self.inner).read(buffer)
    }

    /// Write from `buffer`, returning the number of bytes transferred.
    pub fn write(&self, buffer: &[u8]) -> io::Result<usize> {
        (&self.inner).write(buffer)
    }

    /// Wait until the socket is readable.
    ///
    /// `Ok(true)` ready, `Ok(false)` timed out, `Err` the descriptor is
    /// broken. `None` blocks indefinitely.
    pub fn wait_readable(&self, timeout: Option<Duration>) -> io::Result<bool> {
        poll(self.inner.as_raw_fd(), libc::POLLIN, timeout)
    }

    /// Wait until the socket is writable. Same contract as
    /// [`wait_readable`](Self::wait_readable).
    pub fn wait_writable(&self, timeout: Option<Duration>) -> io::Result<bool> {
        poll(self.inner.as_raw_fd(), libc::POLLOUT, timeout)
    }

    /// Port number the socket is bound to.
    pub fn local_port(&self) -> io::Result<u16> {
        let addr = self.inner.local_addr()?;
        addr.as_socket()
            .map(|s| s.port())
            .ok_or_else(|| io::Error::other("not an inet socket"))
    }
}

impl AsRawFd for Socket {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

fn wildcard(port: u16) -> SockAddr {
    SockAddr::from(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
}

/// Turn a C failure (-1 is returned) into a rust Result
fn cerr(t: libc::c_int) -> io::Result<libc::c_int> {
    match t {
        -1 => Err(io::Error::last_os_error()),
        _ => Ok(t),
    }
}

/// Poll a raw descriptor for readability.
///
/// Used by the receive threads, which snapshot the descriptor out of the
/// shared socket cell so writers are not blocked for the poll duration.
/// The caller must be the only party that can close the descriptor while
/// the call is in flight.
pub(crate) fn poll_readable(fd: RawFd, timeout: Option<Duration>) -> io::Result<bool> {
    poll(fd, libc::POLLIN, timeout)
}

fn poll(fd: RawFd, events: libc::c_short, timeout: Option<Duration>) -> io::Result<bool> {
    let mut pollfd = libc::pollfd {
        fd,
        events,
        revents: 0,
    };

    let timeout_ms: libc::c_int = match timeout {
        Some(t) => t.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
        None => -1,
    };

    // Safety: pollfd points at a stack value that outlives the call, and
    // the descriptor stays open for the duration of the call per the
    // single-closer contract above.
    let ret = match cerr(unsafe { libc::poll(&mut pollfd, 1, timeout_ms) }) {
        Ok(n) => n,
        // A signal landing mid-poll counts as a timeout, not a failure
        Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(false),
        Err(e) => return Err(e),
    };

    if ret == 0 {
        return Ok(false);
    }

    if pollfd.revents & libc::POLLNVAL != 0 {
        return Err(io::Error::from(io::ErrorKind::InvalidInput));
    }

    Ok(true)
}
