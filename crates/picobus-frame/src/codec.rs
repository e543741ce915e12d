use bytes::Bytes;
use tracing::trace;

use crate::error::{FrameError, Result};

/// Zero padding written by the peripheral after its response.
pub const PAD_SENTINEL: u8 = 0x00;

/// Value read while the bus is idle (pulled-up data line).
pub const IDLE_SENTINEL: u8 = 0xFF;

/// Response buffer size of the reference peripheral firmware.
pub const DEFAULT_MAX_LEN: usize = 32;

/// Largest single transfer the Linux i2c-dev driver accepts.
pub const MAX_FRAME_LEN: usize = 8192;

/// Which trailing filler bytes are removed on decode.
///
/// Both sentinels are also legal data bytes, so a message that really ends in
/// `0x00` or `0xFF` loses those bytes. That ambiguity belongs to the wire
/// protocol and is not resolved here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StripPolicy {
    /// Trim trailing `0xFF`, then trim trailing `0x00`, as two separate passes.
    #[default]
    IdleThenPad,
    /// Trim trailing `0x00` only; idle bytes are kept as payload.
    PadOnly,
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Fixed response buffer size in bytes. Must match the peripheral. Default: 32.
    pub max_len: usize,
    /// Trailing filler handling on decode.
    pub strip: StripPolicy,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            strip: StripPolicy::default(),
        }
    }
}

impl FrameConfig {
    /// Largest message the peripheral buffer can carry.
    pub fn max_message_len(&self) -> usize {
        self.max_len.saturating_sub(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_len == 0 {
            return Err(FrameError::InvalidConfig("max_len must be greater than zero"));
        }
        if self.max_len > MAX_FRAME_LEN {
            return Err(FrameError::InvalidConfig("max_len exceeds 8192 bytes"));
        }
        Ok(())
    }
}

/// Encode a message into a block-write payload.
///
/// The bytes go out unchanged and unpadded; the write length is the message
/// length. Non-ASCII bytes are rejected rather than passed through, as is any
/// message of `max_len` bytes or more.
pub fn encode_message(message: &[u8], config: &FrameConfig) -> Result<Bytes> {
    config.validate()?;

    if let Some(position) = message.iter().position(|b| !b.is_ascii()) {
        return Err(FrameError::NonAscii {
            position,
            byte: message[position],
        });
    }

    let max = config.max_message_len();
    if message.len() > max {
        return Err(FrameError::MessageTooLong {
            len: message.len(),
            max,
        });
    }

    Ok(Bytes::copy_from_slice(message))
}

/// [`encode_message`] for string commands.
pub fn encode_command(command: &str, config: &FrameConfig) -> Result<Bytes> {
    encode_message(command.as_bytes(), config)
}

/// Recover the logical message from a received fixed-length frame.
///
/// Returns the prefix left after trailing filler is stripped according to
/// `policy`. An all-filler frame yields an empty slice.
///
/// ```text
/// 'H' 'I' 00 00 FF FF      IdleThenPad -> "HI"
/// 'H' 'I' 00 FF            IdleThenPad -> "HI"
/// 'H' 'I' FF 00            PadOnly     -> "HI\xFF"
/// ```
pub fn decode_frame(frame: &[u8], policy: StripPolicy) -> &[u8] {
    let stripped = match policy {
        StripPolicy::IdleThenPad => trim_trailing(trim_trailing(frame, IDLE_SENTINEL), PAD_SENTINEL),
        StripPolicy::PadOnly => trim_trailing(frame, PAD_SENTINEL),
    };
    trace!(
        frame_len = frame.len(),
        message_len = stripped.len(),
        ?policy,
        "decoded frame"
    );
    stripped
}

/// Build a `max_len` receive frame: `message` followed by `fill`.
///
/// Messages longer than `max_len` are truncated, matching what a fixed-size
/// bus read would return.
pub fn pad_frame(message: &[u8], max_len: usize, fill: u8) -> Bytes {
    let mut frame = vec![fill; max_len];
    let n = message.len().min(max_len);
    frame[..n].copy_from_slice(&message[..n]);
    Bytes::from(frame)
}

fn trim_trailing(bytes: &[u8], sentinel: u8) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != sentinel)
        .map_or(0, |idx| idx + 1);
    &bytes[..end]
}
