//! Partial-frame updates: (offset, RLE run) records patched in place
//! onto an existing framebuffer.

use crate::codec::Rle7Decoder;
use crate::error::DisplayError;
use crate::frame::ScreenFrame;
use tracing::warn;

/// A single delta record never carries more than one display row.
pub const MAX_RECORD_LEN: usize = 128;

/// Apply a delta patch to `frame` in place.
///
/// The patch is a sequence of records: two 7-bit offset bytes (low
/// first, 14-bit offset) followed by one RLE-encoded run of at most
/// [`MAX_RECORD_LEN`] bytes. A malformed record is skipped by scanning
/// forward to the next byte with its high bit set, so one bad record
/// does not discard the rest of the patch; the first failure is still
/// reported after the whole patch has been walked. The framebuffer
/// never changes length, and only bytes inside the valid offset range
/// are overwritten.
pub fn apply_delta(patch: &[u8], frame: &mut ScreenFrame) -> Result<(), DisplayError> {
    let buf = frame.as_mut_bytes();
    let mut first_err: Option<DisplayError> = None;
    let mut s = 0;

    while s + 2 <= patch.len() {
        let offset = (patch[s] as usize & 0x7F) | ((patch[s + 1] as usize & 0x7F) << 7);
        s += 2;

        if offset >= buf.len() {
            warn!(offset, len = buf.len(), "delta offset out of range, resyncing");
            first_err.get_or_insert(DisplayError::InvalidOffset {
                offset,
                len: buf.len(),
            });
            s = resync(patch, s);
            continue;
        }

        let mut rle = Rle7Decoder::new();
        let bound = MAX_RECORD_LEN.min(buf.len() - offset);
        let (run, used) = rle.unpack(&patch[s..], bound);

        if !rle.is_idle() {
            // the patch ends inside this record
            warn!(offset, "delta record truncated, resyncing");
            first_err.get_or_insert(DisplayError::TruncatedInput);
            s = resync(patch, s + used);
            continue;
        }
        if run.is_empty() {
            s = resync(patch, s);
            continue;
        }

        buf[offset..offset + run.len()].copy_from_slice(&run);
        s += used;
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Scan forward to the next byte with the high bit set, taken as the
/// start of the next well-formed record.
fn resync(patch: &[u8], mut s: usize) -> usize {
    while s < patch.len() && patch[s] & 0x80 == 0 {
        s += 1;
    }
    s
}
