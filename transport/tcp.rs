// TCP carrier implementation with socket tuning and a dedicated reader thread
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, warn};
use nix::sys::socket::{setsockopt, sockopt};
use parking_lot::Mutex;

use bytelink_core::{
    TransportError, TransportKind, TransportResult, DISCONNECT_REASON_END_OF_STREAM,
};

use crate::base::{PumpControl, TransportCore};
use crate::config::{TcpConfig, TcpMode};
use crate::traits::Carrier;

pub struct TcpCarrier {
    config: TcpConfig,
    stream: Mutex<Option<TcpStream>>,
    halt: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl TcpCarrier {
    pub fn new(config: TcpConfig) -> Self {
        TcpCarrier {
            config,
            stream: Mutex::new(None),
            halt: Arc::new(AtomicBool::new(false)),
            reader: Mutex::new(None),
        }
    }

    fn establish(&self, hooks: &TransportCore) -> TransportResult<TcpStream> {
        match &self.config.mode {
            TcpMode::Connect(addr) => {
                if addr.is_empty() {
                    return Err(TransportError::InvalidConfig("empty tcp address"));
                }
                TcpStream::connect(addr.as_str()).map_err(|e| TransportError::io("tcp connect", e))
            }
            TcpMode::Listen(port) => {
                let listener = TcpListener::bind(("0.0.0.0", *port))
                    .map_err(|e| TransportError::io("tcp bind", e))?;
                let bound = listener
                    .local_addr()
                    .map_err(|e| TransportError::io("tcp local addr", e))?
                    .port();
                hooks.handle_server_socket_init(bound);
                // One point-to-point session per carrier: accept a single
                // peer and drop the listening socket.
                let (stream, peer) = listener
                    .accept()
                    .map_err(|e| TransportError::io("tcp accept", e))?;
                debug!("tcp peer accepted from {}", peer);
                Ok(stream)
            }
        }
    }

    fn tune(&self, stream: &TcpStream) {
        if let Err(e) = stream.set_nodelay(self.config.nodelay) {
            warn!("tcp nodelay not applied: {}", e);
        }
        if let Some(size) = self.config.send_buf_size {
            if let Err(e) = setsockopt(stream, sockopt::SndBuf, &size) {
                warn!("tcp SO_SNDBUF not applied: {}", e);
            }
        }
        if let Some(size) = self.config.recv_buf_size {
            if let Err(e) = setsockopt(stream, sockopt::RcvBuf, &size) {
                warn!("tcp SO_RCVBUF not applied: {}", e);
            }
        }
    }

    fn read_loop(
        mut stream: TcpStream,
        hooks: Arc<TransportCore>,
        halt: Arc<AtomicBool>,
        buf_size: usize,
    ) {
        let mut buf = vec![0u8; buf_size];
        loop {
            let read = stream.read(&mut buf);
            // A halt request (stop_reading) ends the loop with no event,
            // even when the wakeup came from a socket shutdown.
            if halt.load(Ordering::Acquire) {
                break;
            }
            match read {
                Ok(0) => {
                    hooks.handle_transport_disconnected(DISCONNECT_REASON_END_OF_STREAM);
                    break;
                }
                Ok(n) => {
                    if hooks.handle_received_bytes(&buf[..n]) == PumpControl::Stop {
                        break;
                    }
                }
                Err(e) => {
                    if let Err(fault) = hooks
                        .handle_transport_error("tcp read failed", TransportError::io("tcp read", e))
                    {
                        error!("listener fault while handling tcp read error: {}", fault);
                    }
                    break;
                }
            }
        }
    }
}

impl Carrier for TcpCarrier {
    fn open(&self, hooks: Arc<TransportCore>) -> TransportResult<()> {
        if self.stream.lock().is_some() {
            return Err(TransportError::AlreadyOpen);
        }
        // Listen mode blocks here until a peer dials in.
        let stream = self.establish(&hooks)?;
        self.tune(&stream);
        let reader_stream = stream
            .try_clone()
            .map_err(|e| TransportError::io("tcp clone", e))?;
        {
            let mut slot = self.stream.lock();
            if slot.is_some() {
                return Err(TransportError::AlreadyOpen);
            }
            *slot = Some(stream);
        }
        self.halt.store(false, Ordering::Release);
        hooks.handle_transport_connected();

        let halt = Arc::clone(&self.halt);
        let buf_size = self.config.read_buf_size;
        let handle = thread::Builder::new()
            .name("bytelink-tcp-reader".to_string())
            .spawn(move || Self::read_loop(reader_stream, hooks, halt, buf_size))
            .map_err(|e| TransportError::io("spawn tcp reader", e))?;
        *self.reader.lock() = Some(handle);
        Ok(())
    }

    fn disconnect(&self) {
        if let Some(stream) = self.stream.lock().take() {
            // Unblocks the reader, which then observes end of stream and
            // reports the disconnect.
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.reader.lock().take();
    }

    fn stop_reading(&self) {
        self.halt.store(true, Ordering::Release);
        if let Some(stream) = self.stream.lock().as_ref() {
            // Unblock a parked read; the loop exits on the halt flag.
            let _ = stream.shutdown(Shutdown::Read);
        }
    }

    fn send_raw(&self, bytes: &[u8]) -> bool {
        let mut guard = self.stream.lock();
        match guard.as_mut() {
            Some(stream) => match stream.write_all(bytes) {
                Ok(()) => true,
                Err(e) => {
                    warn!("tcp send failed: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Tcp
    }
}
