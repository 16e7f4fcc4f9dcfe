//! Reassembly of SysEx messages from a packetized MIDI byte stream.
//!
//! MIDI packets split and coalesce arbitrarily; only the `F0`/`F7`
//! markers delimit messages, so this runs byte by byte.

use crate::protocol::{MAX_SYSEX_SIZE, SYSEX_END, SYSEX_START};
use bytes::Bytes;
use tracing::warn;

/// Collects bytes between a SysEx start and end marker.
///
/// At most one message is in flight; a start byte always begins a new
/// one, even when the previous message never terminated.
#[derive(Debug, Default)]
pub struct SysexAssembler {
    buf: Vec<u8>,
    collecting: bool,
}

impl SysexAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport packet; returns every message it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Bytes> {
        let mut complete = Vec::new();
        for &byte in bytes {
            if byte == SYSEX_START {
                if self.collecting && !self.buf.is_empty() {
                    warn!(
                        discarded = self.buf.len(),
                        "unterminated SysEx replaced by new start byte"
                    );
                }
                self.buf.clear();
                self.buf.push(byte);
                self.collecting = true;
                continue;
            }
            if !self.collecting {
                continue;
            }
            if self.buf.len() >= MAX_SYSEX_SIZE {
                warn!("SysEx exceeds {MAX_SYSEX_SIZE} bytes, dropping message");
                self.buf = Vec::new();
                self.collecting = false;
                continue;
            }
            self.buf.push(byte);
            if byte == SYSEX_END {
                complete.push(Bytes::from(std::mem::take(&mut self.buf)));
                self.collecting = false;
            }
        }
        complete
    }
}
