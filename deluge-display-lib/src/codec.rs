//! 7-to-8 bit RLE codec for the Deluge OLED stream.
//!
//! MIDI SysEx payload bytes only carry 7 data bits, so the Deluge packs
//! the stolen high bits into the control bytes of its run-length scheme.
//! Two record kinds exist:
//!
//! - **dense**: a control byte below 64 selects 2-5 literal payload
//!   bytes and doubles as the bitmap of their high bits;
//! - **run-length**: a control byte of 64 or above encodes a repeat
//!   count and the high bit of a single value byte that follows.
//!
//! The sender may cut a message mid-record; the cut tail is carried in
//! [`Rle7Decoder`] and resumed on the next call for the same stream.

use modular_bitfield::prelude::*;
use tracing::trace;

/// First control byte value denoting a run-length record.
const RUN_FLAG: u8 = 64;

/// Inline run length that escapes to an extension byte.
const EXTENDED_RUN: u8 = 31;

/// Two bytes the Deluge emits at the start of every fresh frame body.
const FRAME_HEADER: [u8; 2] = [0x40, 0x01];

/// Bit layout of a run-length marker (control byte minus [`RUN_FLAG`]).
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy)]
struct RunMarker {
    pub high: bool,
    pub run_len: B5,
    #[skip]
    unused: B2,
}

/// Payload size and high-bit offset for a dense control byte.
/// Controls 60-63 carry no payload and are skipped.
fn dense_bucket(control: u8) -> Option<(usize, u8)> {
    match control {
        0..=3 => Some((2, 0)),
        4..=11 => Some((3, 4)),
        12..=27 => Some((4, 12)),
        28..=59 => Some((5, 28)),
        _ => None,
    }
}

/// Streaming decoder for the dense/run-length grammar.
///
/// One instance belongs to one logical stream: the only state it keeps
/// is the pending partial record spanning two calls to
/// [`unpack`](Self::unpack).
#[derive(Debug, Default)]
pub struct Rle7Decoder {
    pending: Vec<u8>,
}

impl Rle7Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no partial record is carried from a previous call.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop any carried partial record.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Decode `src`, producing at most `max_out` unpacked bytes.
    ///
    /// Returns the unpacked bytes and the number of `src` bytes
    /// consumed. A record cut short at the end of `src` is stashed
    /// rather than consumed and resumes on the next call; a stream
    /// opening with the fresh-frame header discards any stash first.
    /// Output beyond `max_out` is silently dropped, never an error.
    pub fn unpack(&mut self, src: &[u8], max_out: usize) -> (Vec<u8>, usize) {
        if src.len() >= 2 && src[..2] == FRAME_HEADER && !self.pending.is_empty() {
            trace!(
                stale = self.pending.len(),
                "fresh frame header, dropping stale partial record"
            );
            self.pending.clear();
        }

        let carried = self.pending.len();
        let work: Vec<u8> = if carried == 0 {
            src.to_vec()
        } else {
            let mut w = std::mem::take(&mut self.pending);
            w.extend_from_slice(src);
            w
        };

        let mut out = Vec::with_capacity(max_out.min(work.len() * 2));
        let mut s = 0;

        while s < work.len() && out.len() < max_out {
            let unit_start = s;
            let control = work[s];
            s += 1;

            if control < RUN_FLAG {
                let Some((size, offset)) = dense_bucket(control) else {
                    continue;
                };
                if s + size > work.len() {
                    self.pending = work[unit_start..].to_vec();
                    s = unit_start;
                    break;
                }
                let high_bits = control - offset;
                for j in 0..size {
                    if out.len() == max_out {
                        break;
                    }
                    let mut byte = work[s + j] & 0x7F;
                    if high_bits & (1 << j) != 0 {
                        byte |= 0x80;
                    }
                    out.push(byte);
                }
                s += size;
            } else {
                let marker = RunMarker::from_bytes([control - RUN_FLAG]);
                let mut run_len = marker.run_len() as usize;
                if marker.run_len() == EXTENDED_RUN {
                    let Some(&extra) = work.get(s) else {
                        self.pending = work[unit_start..].to_vec();
                        s = unit_start;
                        break;
                    };
                    run_len = EXTENDED_RUN as usize + extra as usize;
                    s += 1;
                }
                let Some(&value) = work.get(s) else {
                    self.pending = work[unit_start..].to_vec();
                    s = unit_start;
                    break;
                };
                s += 1;
                let mut byte = value & 0x7F;
                if marker.high() {
                    byte |= 0x80;
                }
                // cap forces truncation instead of overflowing max_out
                let n = run_len.min(max_out - out.len());
                out.resize(out.len() + n, byte);
            }
        }

        // bytes that came from the previous call's stash don't count
        // against this call's input
        let consumed = s.saturating_sub(carried);
        (out, consumed)
    }
}
