//! UDP transport: implicit always-connected peer.
//!
//! Datagram sockets have no connection phase. Every arriving datagram is
//! input from the single listening socket, so the connected-check always
//! holds and reads go straight to the listener. Outbound writes are a
//! documented no-op that reports the requested length as sent: the
//! simulator feed is receive-only.

use super::network::{LinkState, NetworkPort, Transport};
use crate::error::Result;
use crate::net::Socket;
use std::io;
use std::os::fd::{AsRawFd, RawFd};

/// UDP instrument port.
pub type UdpPort = NetworkPort<Udp>;

/// Marker type implementing the UDP half of [`NetworkPort`].
pub struct Udp;

impl Transport for Udp {
    const NAME: &'static str = "udp";

    fn open(port: u16) -> Result<Socket> {
        Ok(Socket::udp_listener(port)?)
    }

    fn accept(_state: &LinkState) -> Result<()> {
        Ok(())
    }

    fn is_connected(_state: &LinkState) -> bool {
        true
    }

    fn rx_fd(state: &LinkState) -> Option<RawFd> {
        state.listener.lock().as_ref().map(|l| l.as_raw_fd())
    }

    fn read(state: &LinkState, buffer: &mut [u8]) -> io::Result<usize> {
        match state.listener.lock().as_ref() {
            Some(listener) => listener.read(buffer),
            None => Ok(0),
        }
    }

    fn write(_state: &LinkState, data: &[u8]) -> io::Result<usize> {
        // transmit is intentionally not implemented; report the full
        // length so callers treat the write as complete
        Ok(data.len())
    }

    fn close_connection(_state: &LinkState) {}
}
