// Core types shared across all bytelink components
use std::fmt;

/// Disconnect reason reported when the remote end closes the byte stream.
pub const DISCONNECT_REASON_END_OF_STREAM: &str = "EndOfStreamReached";

// Carrier tag - fixed at construction, queryable for the lifetime of a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Tcp,
    Bluetooth,
    Usb,
    Loopback,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportKind::Tcp => write!(f, "TCP"),
            TransportKind::Bluetooth => write!(f, "BLUETOOTH"),
            TransportKind::Usb => write!(f, "USB"),
            TransportKind::Loopback => write!(f, "LOOPBACK"),
        }
    }
}
