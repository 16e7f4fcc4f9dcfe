use thiserror::Error;

/// The primary error type for the `deluge-display-lib` library.
///
/// Nothing here is fatal to a session: every variant maps to "drop this
/// unit and keep going", since the periodic full-frame requests re-sync
/// the display on their own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    #[error("stream ended in the middle of a record")]
    TruncatedInput,

    #[error("delta offset {offset} outside framebuffer of {len} bytes")]
    InvalidOffset { offset: usize, len: usize },

    #[error("decoded frame is {actual} bytes, expected exactly {expected}")]
    InvalidFrameSize { expected: usize, actual: usize },

    #[error("message exceeds the SysEx size ceiling")]
    BufferOverflow,

    #[error("SysEx signature does not match the Deluge display protocol")]
    SignatureMismatch,

    #[error("MIDI transport error: {0}")]
    Transport(String),
}
