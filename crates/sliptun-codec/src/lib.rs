//! Streaming SLIP frame codec (RFC 1055 framing).
//!
//! This is the core byte-transformation layer of sliptun. It has no I/O of
//! its own:
//! - [`SlipDecoder`] turns an arbitrarily-chunked serial byte stream into
//!   complete frames, surviving partial reads and split escape sequences.
//! - [`encode_frame`] escapes a payload and appends the frame terminator.
//! - [`OutputBuffer`] holds at most one encoded frame awaiting drain to the
//!   line, with cursors for partial-write resumption.

pub mod decoder;
pub mod error;
pub mod frame;
pub mod outbuf;
pub mod slip;

pub use decoder::SlipDecoder;
pub use error::{CodecError, Result};
pub use frame::{Frame, FrameClass};
pub use outbuf::OutputBuffer;
pub use slip::{encode_frame, END, ESC, ESC_END, ESC_ESC, MAX_FRAME};
