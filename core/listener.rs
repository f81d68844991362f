// Listener contract: the observer a transport reports lifecycle and data events to
use std::sync::Arc;

use crate::error::{ListenerError, TransportError};

/// Callbacks a transport consumer implements to observe one transport
/// instance.
///
/// At most one of {connected, disconnected, error} reports a given lifecycle
/// transition, and the transport is already marked disconnected by the time
/// `on_disconnected` or `on_error` runs.
///
/// Callbacks report faults through `Err` instead of panicking. A fault from
/// `on_bytes_received` or `on_connected` is converted into an error
/// notification by the transport; a fault from `on_error` itself is handed
/// back to whoever raised the error, with no re-entrant dispatch.
pub trait TransportListener: Send + Sync {
    fn on_bytes_received(&self, bytes: &[u8]) -> Result<(), ListenerError>;

    fn on_connected(&self) -> Result<(), ListenerError>;

    fn on_disconnected(&self, reason: &str) -> Result<(), ListenerError>;

    fn on_error(&self, message: &str, cause: &TransportError) -> Result<(), ListenerError>;

    /// Bound-port report from carriers that open a local listening socket.
    /// Most carriers never fire this.
    fn on_server_socket_init(&self, port: u16) -> Result<(), ListenerError> {
        let _ = port;
        Ok(())
    }
}

impl<T: TransportListener + ?Sized> TransportListener for Arc<T> {
    fn on_bytes_received(&self, bytes: &[u8]) -> Result<(), ListenerError> {
        (**self).on_bytes_received(bytes)
    }

    fn on_connected(&self) -> Result<(), ListenerError> {
        (**self).on_connected()
    }

    fn on_disconnected(&self, reason: &str) -> Result<(), ListenerError> {
        (**self).on_disconnected(reason)
    }

    fn on_error(&self, message: &str, cause: &TransportError) -> Result<(), ListenerError> {
        (**self).on_error(message, cause)
    }

    fn on_server_socket_init(&self, port: u16) -> Result<(), ListenerError> {
        (**self).on_server_socket_init(port)
    }
}
