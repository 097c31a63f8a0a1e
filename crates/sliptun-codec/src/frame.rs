use bytes::Bytes;

/// First byte of a command-response frame.
pub const COMMAND_RESPONSE_MARKER: u8 = b'!';
/// First byte of a command-request frame.
pub const COMMAND_REQUEST_MARKER: u8 = b'?';
/// First byte of a debug text line; the remainder is printable text.
pub const DEBUG_LINE_MARKER: u8 = b'\r';

/// One complete decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Bytes,
}

/// What a decoded frame carries, determined by its first byte.
///
/// Frames with a reserved first byte are line diagnostics and never reach
/// the tunnel; everything else is tunnel payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    CommandResponse,
    CommandRequest,
    DebugLine,
    Payload,
}

impl Frame {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Classify by reserved first byte.
    pub fn class(&self) -> FrameClass {
        match self.payload.first() {
            Some(&COMMAND_RESPONSE_MARKER) => FrameClass::CommandResponse,
            Some(&COMMAND_REQUEST_MARKER) => FrameClass::CommandRequest,
            Some(&DEBUG_LINE_MARKER) => FrameClass::DebugLine,
            _ => FrameClass::Payload,
        }
    }
}
