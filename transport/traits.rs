// Carrier abstraction - allows pluggable byte-stream backends
use std::sync::Arc;

use bytelink_core::{TransportKind, TransportResult};

use crate::base::TransportCore;

/// Capability set every concrete carrier supplies. Selected at construction;
/// out-of-tree carriers (Bluetooth serial, USB accessory) plug in through
/// `Transport::with_carrier`.
pub trait Carrier: Send + Sync {
    /// Open the underlying medium and start pumping inbound bytes into
    /// `hooks` from a carrier-owned reader thread.
    fn open(&self, hooks: Arc<TransportCore>) -> TransportResult<()>;

    /// Tear the medium down. The carrier reports the resulting lifecycle
    /// event through the hooks handed over at open time.
    fn disconnect(&self);

    /// Cooperative signal to halt the background read loop without a
    /// lifecycle event.
    fn stop_reading(&self);

    /// The raw send primitive. Returns false on any failure, including a
    /// carrier that is not open; must not panic for transient conditions.
    fn send_raw(&self, bytes: &[u8]) -> bool;

    fn kind(&self) -> TransportKind;
}
