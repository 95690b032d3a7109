//! TCP transport: single-client listener.
//!
//! The listener is created with a backlog of 1: one simulator feed per
//! port. Acceptance only happens while disconnected, so an attached
//! client is never displaced by a later connection attempt; a second
//! client sits in the backlog until the first goes away.

use super::network::{LinkState, NetworkPort, POLL_SLICE, Transport};
use crate::error::{Error, Result};
use crate::net::{Socket, poll_readable};
use std::io;
use std::os::fd::{AsRawFd, RawFd};

/// TCP instrument port.
pub type TcpPort = NetworkPort<Tcp>;

/// Marker type implementing the TCP half of [`NetworkPort`].
pub struct Tcp;

impl Transport for Tcp {
    const NAME: &'static str = "tcp";

    fn open(port: u16) -> Result<Socket> {
        Ok(Socket::tcp_listener(port, 1)?)
    }

    fn accept(state: &LinkState) -> Result<()> {
        let fd = match state.listener.lock().as_ref() {
            Some(listener) => listener.as_raw_fd(),
            None => return Err(Error::NotOpen),
        };

        if poll_readable(fd, Some(POLL_SLICE))? {
            let guard = state.listener.lock();
            let Some(listener) = guard.as_ref() else {
                return Err(Error::NotOpen);
            };
            if let Some(peer) = listener.accept()? {
                log::info!("tcp: client connected");
                *state.connection.lock() = Some(peer);
            }
        }

        Ok(())
    }

    fn is_connected(state: &LinkState) -> bool {
        state.connection.lock().is_some()
    }

    fn rx_fd(state: &LinkState) -> Option<RawFd> {
        state.connection.lock().as_ref().map(|c| c.as_raw_fd())
    }

    fn read(state: &LinkState, buffer: &mut [u8]) -> io::Result<usize> {
        match state.connection.lock().as_ref() {
            Some(connection) => connection.read(buffer),
            None => Ok(0),
        }
    }

    fn write(state: &LinkState, data: &[u8]) -> io::Result<usize> {
        match state.connection.lock().as_ref() {
            Some(connection) => connection.write(data),
            None => Ok(0),
        }
    }

    fn close_connection(state: &LinkState) {
        if state.connection.lock().take().is_some() {
            log::info!("tcp: client disconnected");
        }
    }
}
