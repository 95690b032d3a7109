//! Integration tests for the network port lifecycle.
//!
//! These run against real loopback sockets: client connects, datagram
//! delivery, disconnect/reconnect cycles, and receive-thread start/stop
//! guarantees.

use parking_lot::Mutex;
use std::io::Write;
use std::net::{TcpStream, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use vayu_link::Error;
use vayu_link::port::{DataHandler, Port, TcpPort, UdpPort, WaitResult};

/// Handler that records every chunk the receive thread delivers.
#[derive(Default)]
struct CollectingHandler {
    bytes: Mutex<Vec<u8>>,
    calls: AtomicUsize,
}

impl DataHandler for CollectingHandler {
    fn data_received(&self, data: &[u8]) {
        self.bytes.lock().extend_from_slice(data);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl CollectingHandler {
    fn contains(&self, needle: &[u8]) -> bool {
        self.bytes.lock().windows(needle.len()).any(|w| w == needle)
    }

    fn wait_for(&self, needle: &[u8], timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.contains(needle) {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn open_tcp() -> (TcpPort, Arc<CollectingHandler>, u16) {
    let handler = Arc::new(CollectingHandler::default());
    let mut port = TcpPort::new(handler.clone());
    port.open(0).unwrap();
    let local = port.local_port().unwrap();
    (port, handler, local)
}

fn open_udp() -> (UdpPort, Arc<CollectingHandler>, u16) {
    let handler = Arc::new(CollectingHandler::default());
    let mut port = UdpPort::new(handler.clone());
    port.open(0).unwrap();
    let local = port.local_port().unwrap();
    (port, handler, local)
}

#[test]
fn test_tcp_delivers_bytes_and_recovers_after_disconnect() {
    let (mut port, handler, local) = open_tcp();
    port.start_rx_thread().unwrap();

    let mut client = TcpStream::connect(("127.0.0.1", local)).unwrap();
    client.write_all(b"alpha").unwrap();
    assert!(handler.wait_for(b"alpha", Duration::from_secs(3)));

    // peer loss reverts the port to accepting; a new client works
    drop(client);
    let mut client = TcpStream::connect(("127.0.0.1", local)).unwrap();
    client.write_all(b"bravo").unwrap();
    assert!(handler.wait_for(b"bravo", Duration::from_secs(3)));

    port.stop_rx_thread().unwrap();
}

#[test]
fn test_tcp_no_callbacks_after_stop() {
    let (mut port, handler, local) = open_tcp();
    port.start_rx_thread().unwrap();

    let mut client = TcpStream::connect(("127.0.0.1", local)).unwrap();
    client.write_all(b"before").unwrap();
    assert!(handler.wait_for(b"before", Duration::from_secs(3)));

    port.stop_rx_thread().unwrap();
    let calls_at_stop = handler.call_count();

    // data sent after the join must never reach the handler
    client.write_all(b"after").unwrap();
    thread::sleep(Duration::from_millis(500));
    assert_eq!(handler.call_count(), calls_at_stop);
    assert!(!handler.contains(b"after"));
}

#[test]
fn test_tcp_second_client_waits_for_first_to_leave() {
    let (mut port, handler, local) = open_tcp();
    port.start_rx_thread().unwrap();

    let mut first = TcpStream::connect(("127.0.0.1", local)).unwrap();
    first.write_all(b"one").unwrap();
    assert!(handler.wait_for(b"one", Duration::from_secs(3)));

    // second client sits in the backlog while the first is attached
    let mut second = TcpStream::connect(("127.0.0.1", local)).unwrap();
    second.write_all(b"two").unwrap();
    thread::sleep(Duration::from_millis(600));
    assert!(!handler.contains(b"two"));

    // once the first leaves, the second is accepted and drained
    drop(first);
    assert!(handler.wait_for(b"two", Duration::from_secs(3)));

    port.stop_rx_thread().unwrap();
}

#[test]
fn test_start_rx_thread_is_idempotent() {
    let (mut port, _handler, _local) = open_tcp();
    assert!(port.start_rx_thread().is_ok());
    assert!(port.start_rx_thread().is_ok());
    port.stop_rx_thread().unwrap();
}

#[test]
fn test_stop_without_start_returns_quickly() {
    let (mut port, _handler, _local) = open_tcp();
    let start = Instant::now();
    assert!(port.stop_rx_thread().is_ok());
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[test]
fn test_start_fails_when_not_open() {
    let handler = Arc::new(CollectingHandler::default());
    let mut port = TcpPort::new(handler);
    match port.start_rx_thread() {
        Err(Error::NotOpen) => {}
        other => panic!("expected NotOpen, got {:?}", other),
    }
}

#[test]
fn test_udp_delivers_datagrams() {
    let (mut port, handler, local) = open_udp();
    port.start_rx_thread().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender.send_to(b"frame-1", ("127.0.0.1", local)).unwrap();
    sender.send_to(b"frame-2", ("127.0.0.1", local)).unwrap();

    assert!(handler.wait_for(b"frame-1", Duration::from_secs(3)));
    assert!(handler.wait_for(b"frame-2", Duration::from_secs(3)));

    port.stop_rx_thread().unwrap();
}

#[test]
fn test_udp_write_reports_full_length() {
    let handler = Arc::new(CollectingHandler::default());
    let mut port = UdpPort::new(handler);

    // holds regardless of socket state
    assert_eq!(port.write(&[0u8; 64]), 64);

    port.open(0).unwrap();
    assert_eq!(port.write(&[0u8; 64]), 64);
}

#[test]
fn test_tcp_write_returns_zero_when_disconnected() {
    let (mut port, _handler, _local) = open_tcp();
    assert_eq!(port.write(b"nobody listening"), 0);
}

#[test]
fn test_wait_read_tristate() {
    // no peer attached: the channel is broken, not merely quiet
    let (mut tcp, _handler, _local) = open_tcp();
    assert_eq!(tcp.wait_read(Duration::from_millis(50)), WaitResult::Failed);

    let (mut udp, _handler, local) = open_udp();

    let start = Instant::now();
    assert_eq!(
        udp.wait_read(Duration::from_millis(150)),
        WaitResult::Timeout
    );
    assert!(start.elapsed() >= Duration::from_millis(140));

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender.send_to(b"ready", ("127.0.0.1", local)).unwrap();
    assert_eq!(udp.wait_read(Duration::from_secs(2)), WaitResult::Ready);

    let mut buffer = [0u8; 16];
    let n = udp.read(&mut buffer).unwrap();
    assert_eq!(&buffer[..n], b"ready");

    // nothing left: read polls once and gives up immediately
    match udp.read(&mut buffer) {
        Err(Error::Timeout) => {}
        other => panic!("expected Timeout, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_close_then_reopen() {
    let (mut port, handler, _local) = open_tcp();
    port.start_rx_thread().unwrap();
    port.close();
    assert!(!port.is_valid());

    port.open(0).unwrap();
    assert!(port.is_valid());
    port.start_rx_thread().unwrap();

    let local = port.local_port().unwrap();
    let mut client = TcpStream::connect(("127.0.0.1", local)).unwrap();
    client.write_all(b"again").unwrap();
    assert!(handler.wait_for(b"again", Duration::from_secs(3)));

    port.stop_rx_thread().unwrap();
}
