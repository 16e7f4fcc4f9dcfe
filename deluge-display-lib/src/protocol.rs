//! Wire constants and SysEx message classification for the Deluge
//! display protocol.
//!
//! Every message the Deluge sends for its screen is a SysEx envelope:
//!
//! ```text
//! F0 7D 02 40 <msgType> <reserved> <body...> F7
//! ```
//!
//! `7D` is the non-commercial manufacturer ID, `02 40` the Deluge
//! display sub-IDs. Anything without that prefix is foreign traffic on
//! a shared MIDI bus and is dropped without comment.

use crate::error::DisplayError;
use bytes::Bytes;
use num_enum::{FromPrimitive, IntoPrimitive};

pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;

/// Hard ceiling on one assembled SysEx message; bounds memory against a
/// noisy or misbehaving transport.
pub const MAX_SYSEX_SIZE: usize = 32 * 1024;

/// Prefix every Deluge display message starts with.
pub const DELUGE_SIGNATURE: [u8; 4] = [SYSEX_START, 0x7D, 0x02, 0x40];

/// Command asking the device to send a full OLED frame.
pub const FULL_FRAME_REQUEST: [u8; 6] = [0xF0, 0x7D, 0x02, 0x00, 0x01, 0xF7];

/// Signature, type and reserved bytes plus the trailer.
pub const MIN_MESSAGE_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum MessageType {
    /// RLE-encoded replacement of the whole framebuffer.
    FullFrame = 0x01,

    /// Anything else on the bus; the session drops these.
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// A validated Deluge display message: type tag plus body, with the
/// envelope stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct SysexMessage {
    pub message_type: MessageType,
    pub body: Bytes,
}

impl TryFrom<Bytes> for SysexMessage {
    type Error = DisplayError;

    fn try_from(raw: Bytes) -> Result<Self, Self::Error> {
        if raw.len() > MAX_SYSEX_SIZE {
            return Err(DisplayError::BufferOverflow);
        }
        if raw.len() < MIN_MESSAGE_SIZE
            || raw[..4] != DELUGE_SIGNATURE
            || raw[raw.len() - 1] != SYSEX_END
        {
            return Err(DisplayError::SignatureMismatch);
        }
        let message_type = MessageType::from_primitive(raw[4]);
        // raw[5] is reserved and ignored
        let body = raw.slice(6..raw.len() - 1);
        Ok(Self { message_type, body })
    }
}
