//! The bridge event loop.
//!
//! One logical thread owns both endpoints, the decoder, and the single-slot
//! output buffer. Suspension happens only at the readiness wait; there is
//! no parallelism and no locking. Frames cross the bridge in order, with at
//! most one tunnel message in flight toward the serial line at a time.

pub mod bridge;
pub mod error;
pub mod route;
pub mod shutdown;

pub use bridge::Bridge;
pub use error::{BridgeError, Result};
pub use route::{DiagnosticSink, LogSink};
pub use shutdown::{shutdown_pair, ShutdownSignal, ShutdownTrigger};
