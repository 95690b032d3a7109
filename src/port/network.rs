//! Network port base: listener lifecycle and the receive thread.
//!
//! One [`NetworkPort`] owns up to two sockets and at most one background
//! receive thread. The transport-specific half (accept, connected-check,
//! connection read/write/close) is supplied by a [`Transport`]
//! implementation; the receive-loop algorithm itself is written once.
//!
//! # Lifecycle
//!
//! ```text
//! Closed ──open──► Listening ──start_rx_thread──► Running-Disconnected
//!                                                   │           ▲
//!                                                accept      peer loss
//!                                                   ▼           │
//!                                              Running-Connected┘
//!
//! Running-* ──stop_rx_thread──► Stopped (socket open) ──close──► Closed
//! ```
//!
//! # Stop latency
//!
//! The loop never blocks longer than one 250 ms poll slice, so a stop
//! request is observed within that bound plus any in-flight read.
//!
//! # Shared-resource discipline
//!
//! The socket cells are written only by the receive thread while it
//! runs; callers touch them before `start_rx_thread` and after
//! `stop_rx_thread` has joined. Caller-side writes go through the
//! connection cell's mutex and therefore never race a close. The worker
//! polls on a descriptor snapshot instead of holding the cell locked, so
//! writers are not stalled for a whole poll slice.

use crate::error::{Error, Result};
use crate::net::{Socket, poll_readable};
use crate::port::{DataHandler, Port, WaitResult};
use parking_lot::Mutex;
use std::io;
use std::marker::PhantomData;
use std::os::fd::RawFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Poll slice for the receive loop; bounds the stop latency.
pub(crate) const POLL_SLICE: Duration = Duration::from_millis(250);

/// Fixed receive buffer size. Telemetry frames are far smaller; text
/// protocols are chunked at this granularity.
const RX_BUFFER_SIZE: usize = 1024;

/// Socket cells shared between caller threads and the receive worker.
pub struct LinkState {
    pub(crate) listener: Mutex<Option<Socket>>,
    pub(crate) connection: Mutex<Option<Socket>>,
}

impl LinkState {
    fn new() -> Self {
        Self {
            listener: Mutex::new(None),
            connection: Mutex::new(None),
        }
    }
}

/// Transport-specific half of a network port.
///
/// Implementations are stateless markers ([`Tcp`](crate::port::Tcp),
/// [`Udp`](crate::port::Udp)); all state lives in the shared
/// [`LinkState`].
pub trait Transport: Send + Sync + 'static {
    /// Short name used for thread names and log lines.
    const NAME: &'static str;

    /// Bind the listening socket for this transport.
    fn open(port: u16) -> Result<Socket>;

    /// Try to attach a peer, waiting at most one poll slice.
    ///
    /// `Ok(())` covers both "accepted" and "nothing yet"; an `Err` is
    /// fatal for the port instance.
    fn accept(state: &LinkState) -> Result<()>;

    /// True when a peer is attached.
    fn is_connected(state: &LinkState) -> bool;

    /// Descriptor the receive loop polls for inbound data.
    fn rx_fd(state: &LinkState) -> Option<RawFd>;

    /// Read from the attached peer.
    fn read(state: &LinkState, buffer: &mut [u8]) -> io::Result<usize>;

    /// Write to the attached peer.
    fn write(state: &LinkState, data: &[u8]) -> io::Result<usize>;

    /// Detach the peer, if the transport has that concept.
    fn close_connection(state: &LinkState);
}

/// Generic network listener port.
///
/// See the module docs for the lifecycle and threading contract.
pub struct NetworkPort<T: Transport> {
    state: Arc<LinkState>,
    handler: Arc<dyn DataHandler>,
    rx_thread: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    _transport: PhantomData<T>,
}

impl<T: Transport> NetworkPort<T> {
    /// Create a port that feeds received bytes to `handler`.
    ///
    /// The port is not opened yet. The handler reference is fixed for
    /// the port's lifetime.
    pub fn new(handler: Arc<dyn DataHandler>) -> Self {
        Self {
            state: Arc::new(LinkState::new()),
            handler,
            rx_thread: None,
            stop: Arc::new(AtomicBool::new(false)),
            _transport: PhantomData,
        }
    }

    /// Port number the listener is bound to, once open.
    pub fn local_port(&self) -> Option<u16> {
        self.state
            .listener
            .lock()
            .as_ref()
            .and_then(|l| l.local_port().ok())
    }
}

impl<T: Transport> Port for NetworkPort<T> {
    fn open(&mut self, port: u16) -> Result<()> {
        let mut listener = self.state.listener.lock();
        debug_assert!(listener.is_none(), "port already open");

        let socket = T::open(port)?;
        log::info!("{}: listening on port {}", T::NAME, socket.local_port()?);
        *listener = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        let _ = self.stop_rx_thread();
        self.state.connection.lock().take();
        self.state.listener.lock().take();
    }

    fn is_valid(&self) -> bool {
        self.state.listener.lock().is_some()
    }

    fn drain(&mut self) -> Result<()> {
        // writes are synchronous; nothing is ever pending
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        if !T::is_connected(&self.state) {
            return Err(Error::NotConnected);
        }

        let Some(fd) = T::rx_fd(&self.state) else {
            return Err(Error::NotConnected);
        };
        if !poll_readable(fd, Some(Duration::ZERO))? {
            return Err(Error::Timeout);
        }

        Ok(T::read(&self.state, buffer)?)
    }

    fn write(&mut self, data: &[u8]) -> usize {
        if !T::is_connected(&self.state) {
            return 0;
        }

        T::write(&self.state, data).unwrap_or(0)
    }

    fn wait_read(&mut self, timeout: Duration) -> WaitResult {
        if !T::is_connected(&self.state) {
            return WaitResult::Failed;
        }

        let Some(fd) = T::rx_fd(&self.state) else {
            return WaitResult::Failed;
        };
        match poll_readable(fd, Some(timeout)) {
            Ok(true) => WaitResult::Ready,
            Ok(false) => WaitResult::Timeout,
            Err(_) => WaitResult::Failed,
        }
    }

    fn start_rx_thread(&mut self) -> Result<()> {
        if self.rx_thread.is_some() {
            // already running
            return Ok(());
        }
        if !self.is_valid() {
            return Err(Error::NotOpen);
        }

        self.stop.store(false, Ordering::Relaxed);

        let state = Arc::clone(&self.state);
        let handler = Arc::clone(&self.handler);
        let stop = Arc::clone(&self.stop);

        let thread = thread::Builder::new()
            .name(format!("{}-rx", T::NAME))
            .spawn(move || rx_loop::<T>(&state, &*handler, &stop))?;
        self.rx_thread = Some(thread);
        Ok(())
    }

    fn stop_rx_thread(&mut self) -> Result<()> {
        let Some(thread) = self.rx_thread.take() else {
            return Ok(());
        };

        // Self-join would deadlock; this is caller misuse, not a
        // recoverable condition.
        assert!(
            thread::current().id() != thread.thread().id(),
            "stop_rx_thread called from the receive thread"
        );

        self.stop.store(true, Ordering::Relaxed);
        if thread.join().is_err() {
            log::error!("{}: receive thread panicked", T::NAME);
        }
        Ok(())
    }
}

impl<T: Transport> Drop for NetworkPort<T> {
    fn drop(&mut self) {
        // Join the worker before the sockets go away.
        let _ = self.stop_rx_thread();
    }
}

/// The receive loop.
///
/// Accepts while disconnected, polls and reads while connected, and
/// checks the stop flag once per slice. A fatal accept failure closes
/// the listener and ends the loop for good; the caller must reopen the
/// port explicitly.
fn rx_loop<T: Transport>(state: &LinkState, handler: &dyn DataHandler, stop: &AtomicBool) {
    log::debug!("{}: receive thread started", T::NAME);

    let mut buffer = [0u8; RX_BUFFER_SIZE];

    while !stop.load(Ordering::Relaxed) {
        if !T::is_connected(state) {
            if let Err(e) = T::accept(state) {
                log::error!("{}: accept failed, closing port: {}", T::NAME, e);
                state.listener.lock().take();
                break;
            }
            continue;
        }

        let Some(fd) = T::rx_fd(state) else {
            // peer vanished between checks; go around for a fresh accept
            continue;
        };

        match poll_readable(fd, Some(POLL_SLICE)) {
            Ok(true) => match T::read(state, &mut buffer) {
                Ok(n) if n > 0 => handler.data_received(&buffer[..n]),
                Ok(_) => {
                    // zero bytes: the peer went away
                    T::close_connection(state);
                }
                Err(e) => {
                    log::debug!("{}: read failed: {}", T::NAME, e);
                    T::close_connection(state);
                }
            },
            Ok(false) => {}
            Err(e) => {
                log::warn!("{}: poll failed: {}", T::NAME, e);
                T::close_connection(state);
            }
        }
    }

    log::debug!("{}: receive thread exiting", T::NAME);
}
