// Carrier selection and per-carrier configuration
use std::env;

use bytelink_core::TransportKind;

// Environment variables for tuning
// BYTELINK_READ_BUF_SIZE: reader buffer size in bytes (default: 4096)
// BYTELINK_LOOPBACK_DEPTH: loopback channel depth in messages (default: 64)

pub const DEFAULT_READ_BUF_SIZE: usize = 4096;
pub const DEFAULT_LOOPBACK_DEPTH: usize = 64;

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub enum TcpMode {
    /// Dial out to `host:port`.
    Connect(String),
    /// Bind a local socket (port 0 picks a free one), report the bound port
    /// through the server-socket-init hook, then accept exactly one peer.
    Listen(u16),
}

#[derive(Debug, Clone)]
pub struct TcpConfig {
    pub mode: TcpMode,
    pub nodelay: bool,
    pub read_buf_size: usize,
    /// SO_SNDBUF, left to the OS default when None.
    pub send_buf_size: Option<usize>,
    /// SO_RCVBUF, left to the OS default when None.
    pub recv_buf_size: Option<usize>,
}

impl TcpConfig {
    pub fn connect(addr: &str) -> Self {
        Self::with_mode(TcpMode::Connect(addr.to_string()))
    }

    pub fn listen(port: u16) -> Self {
        Self::with_mode(TcpMode::Listen(port))
    }

    fn with_mode(mode: TcpMode) -> Self {
        TcpConfig {
            mode,
            nodelay: true,
            read_buf_size: env_usize("BYTELINK_READ_BUF_SIZE", DEFAULT_READ_BUF_SIZE),
            send_buf_size: None,
            recv_buf_size: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Messages buffered in flight before sends start failing.
    pub depth: usize,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        LoopbackConfig {
            depth: env_usize("BYTELINK_LOOPBACK_DEPTH", DEFAULT_LOOPBACK_DEPTH),
        }
    }
}

/// Tagged union selecting a built-in carrier and its settings.
#[derive(Debug, Clone)]
pub enum TransportConfig {
    Tcp(TcpConfig),
    Loopback(LoopbackConfig),
}

impl TransportConfig {
    pub fn kind(&self) -> TransportKind {
        match self {
            TransportConfig::Tcp(_) => TransportKind::Tcp,
            TransportConfig::Loopback(_) => TransportKind::Loopback,
        }
    }
}
