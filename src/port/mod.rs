//! Port abstraction for instrument links
//!
//! A [`Port`] is the uniform capability set higher layers program
//! against, regardless of transport: open/close, synchronous writes,
//! non-blocking reads, bounded readable-waits, and a background receive
//! thread that feeds a [`DataHandler`]. Baud rate accessors exist only so
//! network transports can stand in where a serial link is expected; they
//! are compatibility no-ops here.

pub mod network;
mod tcp;
mod udp;

pub use network::NetworkPort;
pub use tcp::{Tcp, TcpPort};
pub use udp::{Udp, UdpPort};

use crate::error::Result;
use std::time::Duration;

/// Outcome of a bounded wait for readable data.
///
/// Callers must be able to tell "nothing yet" from "the channel is
/// broken"; a plain bool cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    /// Data is ready to read.
    Ready,
    /// Nothing arrived within the timeout.
    Timeout,
    /// The port is not connected or the descriptor failed.
    Failed,
}

/// Callback boundary for bytes arriving on a port.
///
/// The receive thread calls [`data_received`](Self::data_received) with
/// each chunk in arrival order. The slice is only valid for the duration
/// of the call; implementations must copy what they keep.
pub trait DataHandler: Send + Sync {
    fn data_received(&self, data: &[u8]);
}

/// Uniform transport capability set.
pub trait Port: Send {
    /// Open the port on the given port number. Must precede
    /// [`start_rx_thread`](Self::start_rx_thread).
    fn open(&mut self, port: u16) -> Result<()>;

    /// Stop the receive thread and release the sockets.
    fn close(&mut self);

    /// True once [`open`](Self::open) has succeeded and the listening
    /// socket is still alive.
    fn is_valid(&self) -> bool;

    /// Block until pending writes are flushed. Synchronous transports
    /// return immediately.
    fn drain(&mut self) -> Result<()>;

    /// Discard buffered data.
    fn flush(&mut self) -> Result<()>;

    /// Non-blocking read: polls once with zero timeout and fails with
    /// [`Error::Timeout`](crate::Error::Timeout) when nothing is ready.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Synchronous write. Returns the byte count actually sent; 0 means
    /// "nothing sent" (no peer, or the transport failed), not an error.
    fn write(&mut self, data: &[u8]) -> usize;

    /// Bounded wait for readable data.
    fn wait_read(&mut self, timeout: Duration) -> WaitResult;

    /// Start the background receive thread. No-op success when it is
    /// already running; fails when the port is not open.
    fn start_rx_thread(&mut self) -> Result<()>;

    /// Signal the receive thread to stop and join it. No-op success when
    /// it was never started. After this returns, no further
    /// [`DataHandler`] callback occurs.
    ///
    /// Must never be called from the receive thread itself; that is a
    /// programming error and asserts.
    fn stop_rx_thread(&mut self) -> Result<()>;

    /// Baud rate of the link. Meaningless for network transports.
    fn baudrate(&self) -> u32 {
        0
    }

    /// Set the baud rate. Compatibility no-op for network transports.
    fn set_baudrate(&mut self, _baud_rate: u32) -> Result<()> {
        Ok(())
    }
}
