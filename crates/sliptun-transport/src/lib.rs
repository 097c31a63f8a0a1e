//! Endpoint layer for sliptun.
//!
//! Two duplex byte channels plus the readiness primitive that multiplexes
//! them:
//! - [`SerialPort`]: a raw-mode, non-blocking character device.
//! - [`TcpTunnel`]: one established TCP connection, dialed out or accepted
//!   from a single peer.
//! - [`PollSet`]: a thin wrapper over `poll(2)`.
//!
//! Unix only, like the serial line it bridges.

pub mod error;
pub mod poll;
pub mod serial;
pub mod tcp;

pub use error::{Result, TransportError};
pub use poll::{Interest, PollSet, Readiness};
pub use serial::{BaudRate, SerialPort, DEFAULT_DEVICES};
pub use tcp::{TcpTunnel, TcpTunnelListener};
