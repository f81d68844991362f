// In-process loopback carrier backed by crossbeam channels
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::warn;
use parking_lot::Mutex;

use bytelink_core::{
    TransportError, TransportKind, TransportResult, DISCONNECT_REASON_END_OF_STREAM,
};

use crate::base::{PumpControl, TransportCore};
use crate::config::LoopbackConfig;
use crate::traits::Carrier;

const PUMP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// The "simulated" carrier: byte frames travel over bounded in-process
/// channels instead of a socket. Echo mode feeds a transport its own sends;
/// pair mode wires two transports back to back.
pub struct LoopbackCarrier {
    tx: Mutex<Option<Sender<Vec<u8>>>>,
    rx: Mutex<Option<Receiver<Vec<u8>>>>,
    halt: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl LoopbackCarrier {
    /// Self-contained carrier: everything sent comes back as received bytes.
    pub fn echo(config: &LoopbackConfig) -> Self {
        let (tx, rx) = bounded(config.depth);
        Self::from_endpoints(tx, rx)
    }

    /// Two carriers wired back to back: bytes sent on one side surface as
    /// received bytes on the other.
    pub fn pair(config: &LoopbackConfig) -> (Self, Self) {
        let (a_tx, b_rx) = bounded(config.depth);
        let (b_tx, a_rx) = bounded(config.depth);
        (
            Self::from_endpoints(a_tx, a_rx),
            Self::from_endpoints(b_tx, b_rx),
        )
    }

    fn from_endpoints(tx: Sender<Vec<u8>>, rx: Receiver<Vec<u8>>) -> Self {
        LoopbackCarrier {
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
            halt: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
            pump: Mutex::new(None),
        }
    }

    fn pump_loop(
        rx: Receiver<Vec<u8>>,
        hooks: Arc<TransportCore>,
        halt: Arc<AtomicBool>,
        closed: Arc<AtomicBool>,
    ) {
        loop {
            // Halt (stop_reading) exits quietly; a local close or a dropped
            // peer surfaces as end of stream.
            if halt.load(Ordering::Acquire) {
                break;
            }
            if closed.load(Ordering::Acquire) {
                hooks.handle_transport_disconnected(DISCONNECT_REASON_END_OF_STREAM);
                break;
            }
            match rx.recv_timeout(PUMP_POLL_INTERVAL) {
                Ok(frame) => {
                    if hooks.handle_received_bytes(&frame) == PumpControl::Stop {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    hooks.handle_transport_disconnected(DISCONNECT_REASON_END_OF_STREAM);
                    break;
                }
            }
        }
    }
}

impl Carrier for LoopbackCarrier {
    fn open(&self, hooks: Arc<TransportCore>) -> TransportResult<()> {
        let rx = self
            .rx
            .lock()
            .take()
            .ok_or(TransportError::AlreadyOpen)?;
        self.halt.store(false, Ordering::Release);
        hooks.handle_transport_connected();

        let halt = Arc::clone(&self.halt);
        let closed = Arc::clone(&self.closed);
        let handle = thread::Builder::new()
            .name("bytelink-loopback-pump".to_string())
            .spawn(move || Self::pump_loop(rx, hooks, halt, closed))
            .map_err(|e| TransportError::io("spawn loopback pump", e))?;
        *self.pump.lock() = Some(handle);
        Ok(())
    }

    fn disconnect(&self) {
        // Dropping the sender ends the peer's stream; the closed flag ends
        // our own pump with a disconnect event.
        self.tx.lock().take();
        self.closed.store(true, Ordering::Release);
        self.pump.lock().take();
    }

    fn stop_reading(&self) {
        self.halt.store(true, Ordering::Release);
    }

    fn send_raw(&self, bytes: &[u8]) -> bool {
        match &*self.tx.lock() {
            Some(tx) => match tx.try_send(bytes.to_vec()) {
                Ok(()) => true,
                Err(e) => {
                    warn!("loopback send failed: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Loopback
    }
}
