// lib: umbrella crate for transport consumers - one import surface

// Re-export core contracts and types
pub use bytelink_core::*;

// Re-export the engine, configs and built-in carriers
pub use bytelink_transport::*;

use std::sync::Arc;

/// Dial out over TCP. The transport connects when `open_connection` runs.
pub fn connect_tcp(addr: &str, listener: Box<dyn TransportListener>) -> Transport {
    Transport::new(TransportConfig::Tcp(TcpConfig::connect(addr)), listener)
}

/// Listen for one TCP peer. `open_connection` binds (port 0 picks a free
/// port), reports the bound port through `on_server_socket_init`, and blocks
/// until a peer dials in.
pub fn listen_tcp(port: u16, listener: Box<dyn TransportListener>) -> Transport {
    Transport::new(TransportConfig::Tcp(TcpConfig::listen(port)), listener)
}

/// In-process transport pair for demos and tests: bytes sent on one side
/// arrive on the other.
pub fn loopback_pair(
    listener_a: Box<dyn TransportListener>,
    listener_b: Box<dyn TransportListener>,
) -> (Transport, Transport) {
    let config = LoopbackConfig::default();
    let (a, b) = LoopbackCarrier::pair(&config);
    (
        Transport::with_carrier(Arc::new(a), listener_a),
        Transport::with_carrier(Arc::new(b), listener_b),
    )
}
