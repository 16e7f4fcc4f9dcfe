//! Common test utilities: a reference encoder for the dense/run-length
//! grammar and builders for Deluge SysEx messages.

// Shared across test files; not every helper is used everywhere.
#![allow(dead_code)]
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use deluge_display_lib::codec::Rle7Decoder;
#[allow(unused_imports)]
pub use deluge_display_lib::error::DisplayError;
#[allow(unused_imports)]
pub use deluge_display_lib::frame::{FRAME_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH, ScreenFrame};
#[allow(unused_imports)]
pub use deluge_display_lib::protocol::{
    DELUGE_SIGNATURE, FULL_FRAME_REQUEST, MessageType, SysexMessage,
};

/// Encode one run-length record (possibly several for very long runs).
fn push_run(out: &mut Vec<u8>, byte: u8, mut len: usize) {
    let high = (byte >> 7) as u8;
    while len > 0 {
        // inline counts reach 30; 31 escapes to an extension byte
        let chunk = len.min(31 + 255);
        if chunk >= 31 {
            out.push(64 + (31 << 1) + high);
            out.push((chunk - 31) as u8);
        } else {
            out.push(64 + ((chunk as u8) << 1) + high);
        }
        out.push(byte & 0x7F);
        len -= chunk;
    }
}

/// Encode 2-5 literal bytes as one dense record.
fn push_dense(out: &mut Vec<u8>, literals: &[u8]) {
    let base: u8 = match literals.len() {
        2 => 0,
        3 => 4,
        4 => 12,
        5 => 28,
        n => panic!("dense record holds 2-5 bytes, got {n}"),
    };
    let mut high_bits = 0u8;
    for (j, b) in literals.iter().enumerate() {
        if b & 0x80 != 0 {
            high_bits |= 1 << j;
        }
    }
    out.push(base + high_bits);
    out.extend(literals.iter().map(|b| b & 0x7F));
}

/// Reference encoder producing the stream [`Rle7Decoder`] consumes.
pub fn encode_7to8_rle(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        let mut n = 1;
        while i + n < data.len() && data[i + n] == b {
            n += 1;
        }
        if n >= 3 {
            push_run(&mut out, b, n);
            i += n;
            continue;
        }
        // gather literals until a worthwhile run starts
        let start = i;
        let mut end = i;
        while end < data.len() && end - start < 5 {
            let c = data[end];
            let mut run = 1;
            while end + run < data.len() && data[end + run] == c {
                run += 1;
            }
            if run >= 3 {
                break;
            }
            end += run;
        }
        let mut lits = &data[start..end.min(start + 5)];
        if lits.len() < 2 {
            // a lone literal only fits as a run of one
            push_run(&mut out, data[start], 1);
            i = start + 1;
            continue;
        }
        if lits.len() > 5 {
            lits = &lits[..5];
        }
        push_dense(&mut out, lits);
        i = start + lits.len();
    }
    out
}

/// Full-frame body as the device sends it: fresh-frame header plus the
/// encoded bitmap.
pub fn encode_frame_body(bitmap: &[u8]) -> Vec<u8> {
    let mut body = vec![0x40, 0x01];
    body.extend(encode_7to8_rle(bitmap));
    body
}

/// Wrap a body in the Deluge SysEx envelope.
pub fn wrap_sysex(message_type: u8, body: &[u8]) -> Vec<u8> {
    let mut msg = DELUGE_SIGNATURE.to_vec();
    msg.push(message_type);
    msg.push(0x00);
    msg.extend_from_slice(body);
    msg.push(0xF7);
    msg
}

/// Deterministic 768-byte bitmap mixing long runs with literal-heavy
/// stretches. Avoids byte values 0x40/0xC0 so the encoded stream never
/// contains a spurious fresh-frame header at a chunk boundary.
pub fn test_bitmap() -> Vec<u8> {
    (0..FRAME_SIZE)
        .map(|i| match (i / SCREEN_WIDTH) % 3 {
            0 => 0xAA,
            1 => (i % 64) as u8 | 0x80,
            _ => {
                if i % 2 == 0 {
                    0x0F
                } else {
                    0x9C
                }
            }
        })
        .collect()
}
