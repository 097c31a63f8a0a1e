/// Errors that can terminate the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Endpoint setup or readiness error.
    #[error("transport error: {0}")]
    Transport(#[from] sliptun_transport::TransportError),

    /// Frame encoding error.
    #[error("codec error: {0}")]
    Codec(#[from] sliptun_codec::CodecError),

    /// The tunnel peer closed the connection. Fatal: there is no
    /// reconnection in the single-peer model.
    #[error("tunnel peer disconnected")]
    PeerDisconnected,

    /// The serial endpoint hung up.
    #[error("serial endpoint closed")]
    SerialClosed,

    /// Signal handler installation failed.
    #[error("signal handler setup failed: {0}")]
    Signal(String),

    /// An endpoint read or write failed with something other than
    /// would-block.
    #[error("bridge I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
