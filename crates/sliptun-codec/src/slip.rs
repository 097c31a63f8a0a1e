use bytes::{BufMut, BytesMut};

use crate::error::{CodecError, Result};

/// Frame delimiter.
pub const END: u8 = 0xC0;
/// Escape prefix: the next byte is a literal.
pub const ESC: u8 = 0xDB;
/// Escaped form of a literal `END` inside a frame.
pub const ESC_END: u8 = 0xDC;
/// Escaped form of a literal `ESC` inside a frame.
pub const ESC_ESC: u8 = 0xDD;

/// Maximum decoded frame size in bytes.
pub const MAX_FRAME: usize = 2000;

/// Encode one payload into the SLIP wire form.
///
/// Every `END` inside the payload becomes `ESC ESC_END`, every `ESC` becomes
/// `ESC ESC_ESC`, all other bytes pass through, and a single literal `END`
/// terminates the frame. Encoding is stateless per call.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_FRAME {
        return Err(CodecError::FrameTooLarge {
            size: payload.len(),
            max: MAX_FRAME,
        });
    }

    dst.reserve(payload.len() + 1);
    for &byte in payload {
        match byte {
            END => {
                dst.put_u8(ESC);
                dst.put_u8(ESC_END);
            }
            ESC => {
                dst.put_u8(ESC);
                dst.put_u8(ESC_ESC);
            }
            _ => dst.put_u8(byte),
        }
    }
    dst.put_u8(END);
    Ok(())
}
