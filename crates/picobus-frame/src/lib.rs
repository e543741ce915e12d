//! Sentinel-padded framing for fixed-length bus transfers.
//!
//! Commands go out as variable-length block writes carrying the message bytes
//! unchanged. Responses come back as a fixed `max_len` buffer in which the
//! logical message is followed by filler:
//! - `0xFF` where the bus sat idle (peripheral stopped driving data)
//! - `0x00` where the peripheral zero-padded its response buffer
//!
//! Decoding strips that trailing filler and hands back the message prefix.

pub mod codec;
pub mod error;

pub use codec::{
    decode_frame, encode_command, encode_message, pad_frame, FrameConfig, StripPolicy,
    DEFAULT_MAX_LEN, IDLE_SENTINEL, MAX_FRAME_LEN, PAD_SENTINEL,
};
pub use error::{FrameError, Result};
