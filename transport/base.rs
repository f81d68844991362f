// Transport engine: connection state, serialized sends, listener dispatch
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use log::{debug, error, warn};
use parking_lot::Mutex;

use bytelink_core::{
    ListenerError, TransportError, TransportKind, TransportListener, TransportResult,
};

use crate::config::TransportConfig;
use crate::loopback::LoopbackCarrier;
use crate::tcp::TcpCarrier;
use crate::traits::Carrier;

type ListenerSlot = ArcSwapOption<Box<dyn TransportListener>>;

/// Signal handed back to carrier read loops: keep pumping or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpControl {
    Continue,
    Stop,
}

/// Carrier-agnostic engine shared between the consumer-facing [`Transport`]
/// and the carrier's reader thread. Tracks connection state, owns the
/// listener slot, and converts listener faults into lifecycle events.
pub struct TransportCore {
    kind: TransportKind,
    connected: AtomicBool,
    listener: ListenerSlot,
    send_lock: Mutex<()>,
}

impl TransportCore {
    pub fn new(kind: TransportKind, listener: Box<dyn TransportListener>) -> Self {
        TransportCore {
            kind,
            connected: AtomicBool::new(false),
            listener: ArcSwapOption::new(Some(Arc::new(listener))),
            send_lock: Mutex::new(()),
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Current connection state. Safe from any thread; a read that happens
    /// after a lifecycle hook observes the hook's update.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Detach the listener. Events raised afterwards are silently dropped.
    /// An in-flight dispatch that already loaded the slot may still deliver
    /// one more event; that race is accepted.
    pub fn remove_listener(&self) {
        self.listener.store(None);
    }

    pub(crate) fn send_guard(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.send_lock.lock()
    }

    // The slot is re-loaded on every dispatch so a concurrent detach wins at
    // the next event boundary. A detached transport swallows events.
    fn dispatch<F>(&self, notify: F) -> Result<(), ListenerError>
    where
        F: FnOnce(&dyn TransportListener) -> Result<(), ListenerError>,
    {
        let guard = self.listener.load();
        match &*guard {
            Some(listener) => notify(&***listener),
            None => Ok(()),
        }
    }

    /// Carrier hook: `bytes` arrived on the wire. Zero-length reports are a
    /// no-op. A listener fault is converted into an error notification and
    /// the read loop is told to stop; nothing propagates back into the
    /// carrier's I/O path.
    pub fn handle_received_bytes(&self, bytes: &[u8]) -> PumpControl {
        if bytes.is_empty() {
            return PumpControl::Continue;
        }
        debug!("{} -> received {} bytes", self.kind, bytes.len());
        match self.dispatch(|l| l.on_bytes_received(bytes)) {
            Ok(()) => PumpControl::Continue,
            Err(fault) => {
                error!("failure propagating received bytes: {}", fault);
                if let Err(nested) =
                    self.handle_transport_error("failure propagating received bytes", fault.into())
                {
                    error!("listener fault while reporting dispatch failure: {}", nested);
                }
                PumpControl::Stop
            }
        }
    }

    /// Carrier hook: the medium is up. Flips state to connected, then
    /// notifies the listener; a fault from the connected callback is routed
    /// through the error path.
    pub fn handle_transport_connected(&self) {
        self.connected.store(true, Ordering::Release);
        debug!("{} connected", self.kind);
        if let Err(fault) = self.dispatch(|l| l.on_connected()) {
            error!("failure propagating connected: {}", fault);
            if let Err(nested) =
                self.handle_transport_error("failure propagating connected", fault.into())
            {
                error!("listener fault while reporting dispatch failure: {}", nested);
            }
        }
    }

    /// Carrier hook: the medium went down. State is already disconnected by
    /// the time the listener runs. Disconnect is terminal, so a fault from
    /// the callback is logged and swallowed.
    pub fn handle_transport_disconnected(&self, reason: &str) {
        self.connected.store(false, Ordering::Release);
        debug!("{} disconnected: {}", self.kind, reason);
        if let Err(fault) = self.dispatch(|l| l.on_disconnected(reason)) {
            error!("failure propagating disconnected: {}", fault);
        }
    }

    /// Carrier hook: a carrier fault. State is forced to disconnected before
    /// the listener runs. A fault from the error callback itself is returned
    /// to the caller rather than re-dispatched.
    pub fn handle_transport_error(
        &self,
        message: &str,
        cause: TransportError,
    ) -> Result<(), ListenerError> {
        self.connected.store(false, Ordering::Release);
        warn!("{} error: {}: {}", self.kind, message, cause);
        self.dispatch(|l| l.on_error(message, &cause))
    }

    /// Carrier hook: a server-mode carrier bound a local socket. Passthrough
    /// only, no state change.
    pub fn handle_server_socket_init(&self, port: u16) {
        debug!("{} server socket bound on port {}", self.kind, port);
        if let Err(fault) = self.dispatch(|l| l.on_server_socket_init(port)) {
            error!("failure propagating server socket init: {}", fault);
        }
    }
}

/// Consumer-facing transport: one carrier plus the shared engine.
pub struct Transport {
    core: Arc<TransportCore>,
    carrier: Arc<dyn Carrier>,
}

impl Transport {
    /// Build a transport over one of the built-in carriers.
    pub fn new(config: TransportConfig, listener: Box<dyn TransportListener>) -> Self {
        let carrier: Arc<dyn Carrier> = match config {
            TransportConfig::Tcp(cfg) => Arc::new(TcpCarrier::new(cfg)),
            TransportConfig::Loopback(cfg) => Arc::new(LoopbackCarrier::echo(&cfg)),
        };
        Self::with_carrier(carrier, listener)
    }

    /// Build a transport over an externally supplied carrier.
    pub fn with_carrier(carrier: Arc<dyn Carrier>, listener: Box<dyn TransportListener>) -> Self {
        let core = Arc::new(TransportCore::new(carrier.kind(), listener));
        Transport { core, carrier }
    }

    pub fn open_connection(&self) -> TransportResult<()> {
        self.carrier.open(Arc::clone(&self.core))
    }

    pub fn disconnect(&self) {
        self.carrier.disconnect();
    }

    pub fn stop_reading(&self) {
        self.carrier.stop_reading();
    }

    pub fn is_connected(&self) -> bool {
        self.core.is_connected()
    }

    pub fn kind(&self) -> TransportKind {
        self.core.kind()
    }

    pub fn remove_listener(&self) {
        self.core.remove_listener();
    }

    /// Send the whole buffer. See [`Transport::send_bytes_range`].
    pub fn send_bytes(&self, message: &[u8]) -> bool {
        self.send_bytes_range(message, 0, message.len())
    }

    /// Send `length` bytes starting at `offset`, serialized against every
    /// other send on this instance so concurrent senders never interleave
    /// on the wire. Returns the carrier primitive's result unchanged; an
    /// out-of-range request is rejected with `false` without reaching the
    /// carrier. Does not gate on [`Transport::is_connected`] - a carrier
    /// that is not open fails the send itself.
    pub fn send_bytes_range(&self, message: &[u8], offset: usize, length: usize) -> bool {
        let end = match offset.checked_add(length) {
            Some(end) if end <= message.len() => end,
            _ => {
                warn!(
                    "{} send rejected: range {}+{} exceeds buffer of {} bytes",
                    self.kind(),
                    offset,
                    length,
                    message.len()
                );
                return false;
            }
        };
        let _guard = self.core.send_guard();
        debug!("{} <- sending {} bytes", self.kind(), length);
        self.carrier.send_raw(&message[offset..end])
    }
}
