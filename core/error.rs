// Error taxonomy for the transport layer
use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

/// Fault raised by a listener callback. Carries a message only; richer
/// context stays on the listener's side.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        ListenerError {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("carrier is not open")]
    NotConnected,

    #[error("carrier is already open")]
    AlreadyOpen,

    #[error("invalid transport configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("listener fault: {0}")]
    Listener(#[from] ListenerError),
}

impl TransportError {
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        TransportError::Io { context, source }
    }
}
