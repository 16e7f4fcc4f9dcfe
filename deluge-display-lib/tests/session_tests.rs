//! Tests for the session controller, sync core and async worker.

mod common;

use common::*;
use deluge_display_lib::session::{
    ConnectionState, DelugeSession, MidiSender, REQUEST_INTERVAL, ScreenDecoder,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn full_frame_end_to_end() {
    let bitmap = test_bitmap();
    let msg = wrap_sysex(0x01, &encode_frame_body(&bitmap));

    let mut decoder = ScreenDecoder::new();
    assert_eq!(decoder.state(), ConnectionState::Connecting);

    // arbitrary transport chunking
    let mut frames = Vec::new();
    for chunk in msg.chunks(17) {
        frames.extend(decoder.ingest(chunk));
    }

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].as_bytes(), bitmap.as_slice());
    assert_eq!(decoder.frame().as_bytes(), bitmap.as_slice());
    assert_eq!(decoder.state(), ConnectionState::Connected);
}

#[test]
fn short_frame_is_dropped() {
    // body decodes to 100 bytes, not a whole frame
    let msg = wrap_sysex(0x01, &encode_frame_body(&vec![0x2A; 100]));

    let mut decoder = ScreenDecoder::new();
    assert!(decoder.ingest(&msg).is_empty());
    assert_eq!(decoder.state(), ConnectionState::Connecting);
}

#[test]
fn foreign_and_unknown_messages_are_ignored() {
    let mut decoder = ScreenDecoder::new();

    // channel noise, foreign SysEx, unknown Deluge message type
    assert!(decoder.ingest(&[0x90, 0x3C, 0x7F]).is_empty());
    assert!(
        decoder
            .ingest(&[0xF0, 0x41, 0x10, 0x16, 0x12, 0x00, 0xF7])
            .is_empty()
    );
    assert!(decoder.ingest(&wrap_sysex(0x42, &[0x01, 0x02])).is_empty());
    assert_eq!(decoder.state(), ConnectionState::Connecting);
}

#[test]
fn delta_message_patches_current_frame() {
    let bitmap = test_bitmap();
    let mut decoder = ScreenDecoder::new();
    decoder.ingest(&wrap_sysex(0x01, &encode_frame_body(&bitmap)));

    let mut patch = vec![0x00, 0x00];
    patch.extend(encode_7to8_rle(&vec![0x8E; 128]));
    decoder.apply_delta_message(&patch).expect("delta failed");

    assert!(decoder.frame().as_bytes()[..128].iter().all(|&b| b == 0x8E));
    assert_eq!(&decoder.frame().as_bytes()[128..], &bitmap[128..]);
}

#[test]
fn consecutive_frames_replace_each_other() {
    let mut decoder = ScreenDecoder::new();

    let first = vec![0x0F; FRAME_SIZE];
    let second = vec![0x99; FRAME_SIZE];
    let mut stream = wrap_sysex(0x01, &encode_frame_body(&first));
    stream.extend(wrap_sysex(0x01, &encode_frame_body(&second)));

    let frames = decoder.ingest(&stream);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].as_bytes(), first.as_slice());
    assert_eq!(frames[1].as_bytes(), second.as_slice());
    assert_eq!(decoder.frame().as_bytes(), second.as_slice());
}

#[test]
fn pixel_accessor_puts_lsb_on_top() {
    let mut bytes = vec![0u8; FRAME_SIZE];
    bytes[3] = 0b0000_0001; // block 0, column 3
    bytes[128 + 7] = 0b1000_0000; // block 1, column 7
    let frame = ScreenFrame::from_bytes(&bytes).expect("frame");

    assert!(frame.pixel(3, 0));
    assert!(!frame.pixel(3, 7));
    assert!(frame.pixel(7, 15));
    assert!(!frame.pixel(7, 8));
}

#[test]
fn ascii_render_has_expected_shape() {
    let frame = ScreenFrame::default();
    let art = frame.to_ascii();
    let lines: Vec<&str> = art.lines().collect();
    assert_eq!(lines.len(), SCREEN_HEIGHT);
    assert!(lines.iter().all(|l| l.chars().count() == SCREEN_WIDTH));
}

/// Records everything the session tries to transmit.
#[derive(Clone, Default)]
struct RecordingSender(Arc<Mutex<Vec<Vec<u8>>>>);

impl MidiSender for RecordingSender {
    fn send(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.0.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn session_publishes_frames_and_state() {
    let sender = RecordingSender::default();
    let session = DelugeSession::connect("Deluge Port 3", sender.clone());
    let mut frames = session.frames();
    let mut state = session.connection_state();

    assert_eq!(*state.borrow(), ConnectionState::Connecting);

    let bitmap = test_bitmap();
    for chunk in wrap_sysex(0x01, &encode_frame_body(&bitmap)).chunks(64) {
        session.ingest(chunk);
    }

    tokio::time::timeout(Duration::from_secs(5), frames.changed())
        .await
        .expect("no frame published")
        .expect("worker gone");
    assert_eq!(frames.borrow_and_update().as_bytes(), bitmap.as_slice());

    tokio::time::timeout(Duration::from_secs(5), state.changed())
        .await
        .expect("no state change")
        .expect("worker gone");
    assert_eq!(*state.borrow_and_update(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn session_requests_full_frames_periodically() {
    let sender = RecordingSender::default();
    let session = DelugeSession::connect("Deluge Port 3", sender.clone());

    // let a handful of request ticks elapse
    tokio::time::sleep(REQUEST_INTERVAL * 5).await;

    let sent = sender.0.lock().unwrap().clone();
    assert!(sent.len() >= 4, "expected several requests, got {}", sent.len());
    assert!(sent.iter().all(|req| req.as_slice() == FULL_FRAME_REQUEST));

    drop(session);
}
