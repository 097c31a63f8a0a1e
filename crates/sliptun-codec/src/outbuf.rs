use bytes::BytesMut;

use crate::error::{CodecError, Result};
use crate::slip::encode_frame;

/// Single-slot queue for one encoded frame awaiting drain to the line.
///
/// `begin`/`end` cursors support partial-write resumption: the consumer
/// writes whatever the transport accepts and advances `begin`; both cursors
/// reset to zero once the frame is fully drained. A new frame may only be
/// queued while the buffer is empty — this is the entire backpressure
/// mechanism between tunnel input and serial output.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    buf: BytesMut,
    begin: usize,
    end: usize,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Encode `payload` into the slot.
    ///
    /// Fails with [`CodecError::Busy`] while a previous frame is still
    /// draining.
    pub fn queue(&mut self, payload: &[u8]) -> Result<()> {
        if !self.is_empty() {
            return Err(CodecError::Busy);
        }
        self.buf.clear();
        encode_frame(payload, &mut self.buf)?;
        self.begin = 0;
        self.end = self.buf.len();
        Ok(())
    }

    /// The undrained portion of the pending frame.
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.begin..self.end]
    }

    /// Record that `n` pending bytes were written to the transport.
    pub fn consume(&mut self, n: usize) {
        self.begin = (self.begin + n).min(self.end);
        if self.begin == self.end {
            self.begin = 0;
            self.end = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slip::{END, ESC, ESC_END};

    #[test]
    fn queue_encodes_and_pending_exposes_wire_bytes() {
        let mut outbuf = OutputBuffer::new();
        outbuf.queue(&[b'h', b'i', END]).unwrap();
        assert_eq!(outbuf.pending(), &[b'h', b'i', ESC, ESC_END, END]);
    }

    #[test]
    fn starts_empty() {
        let outbuf = OutputBuffer::new();
        assert!(outbuf.is_empty());
        assert!(outbuf.pending().is_empty());
    }

    #[test]
    fn second_queue_while_draining_is_rejected() {
        let mut outbuf = OutputBuffer::new();
        outbuf.queue(b"one").unwrap();
        let err = outbuf.queue(b"two").unwrap_err();
        assert!(matches!(err, CodecError::Busy));
        // The pending frame is untouched.
        assert_eq!(outbuf.pending(), &[b'o', b'n', b'e', END]);
    }

    #[test]
    fn partial_consume_advances_then_resets() {
        let mut outbuf = OutputBuffer::new();
        outbuf.queue(b"abcd").unwrap();

        outbuf.consume(2);
        assert_eq!(outbuf.pending(), &[b'c', b'd', END]);
        assert!(!outbuf.is_empty());

        outbuf.consume(3);
        assert!(outbuf.is_empty());

        // Cursors reset: the slot is reusable.
        outbuf.queue(b"x").unwrap();
        assert_eq!(outbuf.pending(), &[b'x', END]);
    }

    #[test]
    fn consume_is_clamped_to_pending() {
        let mut outbuf = OutputBuffer::new();
        outbuf.queue(b"z").unwrap();
        outbuf.consume(100);
        assert!(outbuf.is_empty());
    }

    #[test]
    fn empty_payload_queues_bare_delimiter() {
        let mut outbuf = OutputBuffer::new();
        outbuf.queue(b"").unwrap();
        assert_eq!(outbuf.pending(), &[END]);
        outbuf.consume(1);
        assert!(outbuf.is_empty());
    }

    #[test]
    fn oversized_payload_leaves_buffer_empty() {
        let mut outbuf = OutputBuffer::new();
        let payload = vec![0u8; crate::slip::MAX_FRAME + 1];
        let err = outbuf.queue(&payload).unwrap_err();
        assert!(matches!(err, CodecError::FrameTooLarge { .. }));
        assert!(outbuf.is_empty());
    }
}
