/// Errors that can occur during SLIP encoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload exceeds the maximum frame size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// A frame was queued while a previous one was still draining.
    ///
    /// The output buffer holds one frame at a time; hitting this means the
    /// caller violated the single-frame-in-flight rule.
    #[error("output buffer already holds a pending frame")]
    Busy,
}

pub type Result<T> = std::result::Result<T, CodecError>;
