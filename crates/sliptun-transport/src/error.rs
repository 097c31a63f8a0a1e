use std::path::PathBuf;

/// Errors that can occur in endpoint setup and readiness operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open serial device {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to put the serial device into raw mode.
    #[error("failed to configure serial device {path}: {source}")]
    Configure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// None of the default serial devices could be opened.
    #[error("no usable serial device among defaults")]
    NoDevice,

    /// The requested baud rate is not in the supported set.
    #[error("unsupported baud rate {0}")]
    UnsupportedBaud(u32),

    /// Failed to resolve the tunnel address.
    #[error("failed to resolve {addr}: {source}")]
    Resolve {
        addr: String,
        source: std::io::Error,
    },

    /// No resolved candidate address accepted the connection.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to bind the tunnel listen port.
    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },

    /// Failed to accept the tunnel peer.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// The readiness wait failed.
    #[error("poll failed: {0}")]
    Poll(std::io::Error),

    /// An I/O error occurred on an endpoint.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
