// TCP carrier end-to-end: dial-out, listen-and-accept, end-of-stream and
// connect failures against real sockets on the loopback interface.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use bytelink_core::{
    ListenerError, TransportError, TransportListener, DISCONNECT_REASON_END_OF_STREAM,
};
use bytelink_transport::{TcpConfig, Transport, TransportConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Connected,
    Bytes(Vec<u8>),
    Disconnected(String),
    Error(String),
    ServerSocket(u16),
}

#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    /// All received payloads concatenated, since TCP may split a write into
    /// several reads.
    fn received(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Bytes(b) => Some(b),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn bound_port(&self) -> Option<u16> {
        self.events().into_iter().find_map(|e| match e {
            Event::ServerSocket(port) => Some(port),
            _ => None,
        })
    }
}

impl TransportListener for RecordingListener {
    fn on_bytes_received(&self, bytes: &[u8]) -> Result<(), ListenerError> {
        self.record(Event::Bytes(bytes.to_vec()));
        Ok(())
    }

    fn on_connected(&self) -> Result<(), ListenerError> {
        self.record(Event::Connected);
        Ok(())
    }

    fn on_disconnected(&self, reason: &str) -> Result<(), ListenerError> {
        self.record(Event::Disconnected(reason.to_string()));
        Ok(())
    }

    fn on_error(&self, message: &str, _cause: &TransportError) -> Result<(), ListenerError> {
        self.record(Event::Error(message.to_string()));
        Ok(())
    }

    fn on_server_socket_init(&self, port: u16) -> Result<(), ListenerError> {
        self.record(Event::ServerSocket(port));
        Ok(())
    }
}

fn wait_until(timeout_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    cond()
}

#[test]
fn connect_mode_end_to_end() {
    let server = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let listener = Arc::new(RecordingListener::default());
    let transport = Transport::new(
        TransportConfig::Tcp(TcpConfig::connect(&addr)),
        Box::new(Arc::clone(&listener)),
    );

    transport.open_connection().unwrap();
    assert!(transport.is_connected());
    let (mut peer, _) = server.accept().unwrap();

    peer.write_all(b"hello from peer").unwrap();
    assert!(wait_until(2000, || listener.received() == b"hello from peer"));

    assert!(transport.send_bytes(b"hello from transport"));
    let mut buf = [0u8; 20];
    peer.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"hello from transport");

    // Peer hangup surfaces as end of stream, not as an error.
    drop(peer);
    let end = Event::Disconnected(DISCONNECT_REASON_END_OF_STREAM.to_string());
    assert!(wait_until(2000, || listener.events().contains(&end)));
    assert!(!transport.is_connected());
    assert!(!listener.events().iter().any(|e| matches!(e, Event::Error(_))));

    transport.disconnect();
}

#[test]
fn listen_mode_reports_bound_port_and_accepts_one_peer() {
    let listener = Arc::new(RecordingListener::default());
    let transport = Arc::new(Transport::new(
        TransportConfig::Tcp(TcpConfig::listen(0)),
        Box::new(Arc::clone(&listener)),
    ));

    // open_connection blocks in accept, so it runs on its own thread.
    let opener = {
        let transport = Arc::clone(&transport);
        thread::spawn(move || transport.open_connection())
    };

    assert!(wait_until(2000, || listener.bound_port().is_some()));
    let port = listener.bound_port().unwrap();
    assert_ne!(port, 0);

    let mut peer = TcpStream::connect(("127.0.0.1", port)).unwrap();
    opener.join().unwrap().unwrap();
    assert!(transport.is_connected());

    peer.write_all(b"dialed in").unwrap();
    assert!(wait_until(2000, || listener.received() == b"dialed in"));

    assert!(transport.send_bytes(b"welcome"));
    let mut buf = [0u8; 7];
    peer.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"welcome");

    transport.disconnect();
    let end = Event::Disconnected(DISCONNECT_REASON_END_OF_STREAM.to_string());
    assert!(wait_until(2000, || listener.events().contains(&end)));
    assert!(!transport.is_connected());
}

#[test]
fn connect_failure_is_an_io_error_with_no_events() {
    let listener = Arc::new(RecordingListener::default());
    // Bind-then-drop guarantees a port nothing is listening on.
    let addr = {
        let socket = TcpListener::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap().to_string()
    };
    let transport = Transport::new(
        TransportConfig::Tcp(TcpConfig::connect(&addr)),
        Box::new(Arc::clone(&listener)),
    );

    let err = transport.open_connection().unwrap_err();
    assert!(matches!(err, TransportError::Io { .. }));
    assert!(!transport.is_connected());
    assert!(listener.events().is_empty());

    // A carrier that never opened fails sends through the bool alone.
    assert!(!transport.send_bytes(b"nobody home"));
    assert!(listener.events().is_empty());
}
