/// Errors that can occur while building a frame.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    /// The message contains a byte outside 7-bit ASCII.
    #[error("non-ASCII byte 0x{byte:02X} at offset {position}")]
    NonAscii { position: usize, byte: u8 },

    /// The message does not fit the peripheral's response buffer.
    #[error("message too long ({len} bytes, max {max})")]
    MessageTooLong { len: usize, max: usize },

    /// The frame configuration is unusable.
    #[error("invalid frame config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, FrameError>;
