use bytes::{BufMut, BytesMut};
use tracing::warn;

use crate::frame::Frame;
use crate::slip::{END, ESC, ESC_END, ESC_ESC, MAX_FRAME};

/// Escape-tracking state, persisted across [`SlipDecoder::decode`] calls.
///
/// `Escaped` is an explicit state rather than a pushed-back byte: when input
/// ends right after an `ESC`, the next call resumes by interpreting exactly
/// one more byte as the escaped literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Normal,
    Escaped,
}

/// Streaming SLIP decoder.
///
/// Owns the frame accumulator; a frame's bytes may arrive over arbitrarily
/// many `decode` calls. Completed frames are returned in arrival order.
#[derive(Debug)]
pub struct SlipDecoder {
    buf: BytesMut,
    state: DecodeState,
    max_frame: usize,
    /// Discarding the rest of an oversized run, up to the next delimiter.
    discarding: bool,
    frames_dropped: u64,
}

impl SlipDecoder {
    pub fn new() -> Self {
        Self::with_max_frame(MAX_FRAME)
    }

    pub fn with_max_frame(max_frame: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_frame.min(MAX_FRAME)),
            state: DecodeState::Normal,
            max_frame,
            discarding: false,
            frames_dropped: 0,
        }
    }

    /// Consume all of `input`, returning the frames it completed.
    ///
    /// Feeding the stream one byte at a time yields the same frames, in the
    /// same order, as feeding it whole.
    pub fn decode(&mut self, input: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();

        for &byte in input {
            match self.state {
                DecodeState::Escaped => {
                    let literal = match byte {
                        ESC_END => END,
                        ESC_ESC => ESC,
                        // Lenient: an unknown escape preserves the byte.
                        other => other,
                    };
                    self.state = DecodeState::Normal;
                    self.accumulate(literal);
                }
                DecodeState::Normal => match byte {
                    END => {
                        if self.discarding {
                            self.discarding = false;
                        } else if !self.buf.is_empty() {
                            frames.push(Frame::new(self.buf.split().freeze()));
                        }
                        // An empty accumulator at END is a no-op: consecutive
                        // delimiters and stream startup produce no frame.
                    }
                    ESC => self.state = DecodeState::Escaped,
                    other => self.accumulate(other),
                },
            }
        }

        frames
    }

    fn accumulate(&mut self, byte: u8) {
        if self.discarding {
            return;
        }
        if self.buf.len() >= self.max_frame {
            warn!(
                len = self.buf.len(),
                "dropping oversized partial frame"
            );
            self.buf.clear();
            self.discarding = true;
            self.frames_dropped += 1;
            return;
        }
        self.buf.put_u8(byte);
    }

    /// Bytes accumulated toward the next (incomplete) frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Oversized partial frames discarded so far.
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }
}

impl Default for SlipDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::slip::encode_frame;

    fn payloads(frames: &[Frame]) -> Vec<Vec<u8>> {
        frames.iter().map(|f| f.payload().to_vec()).collect()
    }

    #[test]
    fn simple_frame() {
        let mut decoder = SlipDecoder::new();
        let frames = decoder.decode(&[b'A', b'B', END]);
        assert_eq!(payloads(&frames), vec![b"AB".to_vec()]);
    }

    #[test]
    fn consecutive_delimiters_emit_nothing() {
        let mut decoder = SlipDecoder::new();
        assert!(decoder.decode(&[END, END]).is_empty());
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn escaped_end_and_esc_decode_to_literals() {
        let mut decoder = SlipDecoder::new();
        let frames = decoder.decode(&[ESC, ESC_END, ESC, ESC_ESC, END]);
        assert_eq!(payloads(&frames), vec![vec![END, ESC]]);
    }

    #[test]
    fn unknown_escape_is_preserved_verbatim() {
        let mut decoder = SlipDecoder::new();
        let frames = decoder.decode(&[ESC, 0x42, END]);
        assert_eq!(payloads(&frames), vec![vec![0x42]]);
    }

    #[test]
    fn escape_split_across_calls() {
        let mut decoder = SlipDecoder::new();
        assert!(decoder.decode(&[b'x', ESC]).is_empty());
        let frames = decoder.decode(&[ESC_END, END]);
        assert_eq!(payloads(&frames), vec![vec![b'x', END]]);
    }

    #[test]
    fn byte_at_a_time_matches_whole_stream() {
        let mut stream = Vec::new();
        let mut whole = BytesMut::new();
        encode_frame(&[0x01, END, 0x02], &mut whole).unwrap();
        stream.extend_from_slice(&whole);
        let mut second = BytesMut::new();
        encode_frame(&[ESC, 0xFF], &mut second).unwrap();
        stream.extend_from_slice(&second);

        let mut all_at_once = SlipDecoder::new();
        let expected = payloads(&all_at_once.decode(&stream));

        let mut one_by_one = SlipDecoder::new();
        let mut got = Vec::new();
        for &byte in &stream {
            got.extend(payloads(&one_by_one.decode(&[byte])));
        }

        assert_eq!(got, expected);
        assert_eq!(
            expected,
            vec![vec![0x01, END, 0x02], vec![ESC, 0xFF]]
        );
    }

    #[test]
    fn roundtrip() {
        let payload: Vec<u8> = (0..=255u8)
            .filter(|&b| b != END && b != ESC)
            .collect();
        let mut wire = BytesMut::new();
        encode_frame(&payload, &mut wire).unwrap();

        let mut decoder = SlipDecoder::new();
        let frames = decoder.decode(&wire);
        assert_eq!(payloads(&frames), vec![payload]);
    }

    #[test]
    fn oversized_run_discarded_next_frame_survives() {
        let mut decoder = SlipDecoder::with_max_frame(8);

        let mut stream = vec![0x55u8; 32];
        stream.push(END);
        stream.extend_from_slice(&[b'o', b'k', END]);

        let frames = decoder.decode(&stream);
        assert_eq!(payloads(&frames), vec![b"ok".to_vec()]);
        assert_eq!(decoder.frames_dropped(), 1);
    }

    #[test]
    fn oversized_run_with_escapes_stays_framed() {
        let mut decoder = SlipDecoder::with_max_frame(4);

        // An escaped END inside the discarded run must not be mistaken for
        // a frame boundary.
        let mut stream = vec![0x55u8; 10];
        stream.extend_from_slice(&[ESC, ESC_END]);
        stream.extend_from_slice(&[0x55u8; 10]);
        stream.push(END);
        stream.extend_from_slice(&[b'A', END]);

        let frames = decoder.decode(&stream);
        assert_eq!(payloads(&frames), vec![b"A".to_vec()]);
        assert_eq!(decoder.frames_dropped(), 1);
    }

    #[test]
    fn exactly_max_sized_frame_is_emitted() {
        let mut decoder = SlipDecoder::with_max_frame(4);
        let frames = decoder.decode(&[1, 2, 3, 4, END]);
        assert_eq!(payloads(&frames), vec![vec![1, 2, 3, 4]]);
        assert_eq!(decoder.frames_dropped(), 0);
    }

    #[test]
    fn multiple_frames_in_one_call_keep_order() {
        let mut decoder = SlipDecoder::new();
        let frames = decoder.decode(&[b'1', END, b'2', END, b'3', END]);
        assert_eq!(
            payloads(&frames),
            vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]
        );
    }

    #[test]
    fn partial_frame_carries_across_calls() {
        let mut decoder = SlipDecoder::new();
        assert!(decoder.decode(b"hel").is_empty());
        assert_eq!(decoder.pending(), 3);
        let frames = decoder.decode(&[b'l', b'o', END]);
        assert_eq!(payloads(&frames), vec![b"hello".to_vec()]);
        assert_eq!(decoder.pending(), 0);
    }
}
