//! Protocol session controller.
//!
//! [`ScreenDecoder`] is the synchronous core: it owns the assembler,
//! the RLE decoder and the canonical framebuffer, and turns raw
//! transport bytes into decoded frames. [`DelugeSession`] wraps it in a
//! tokio worker so decode work never runs on the transport's delivery
//! callback: bytes come in over a channel, frames and connection state
//! go out over `watch` channels (single writer, so readers always see a
//! whole frame, never a torn one), and a timer drives the full-frame
//! request cadence.

use crate::codec::Rle7Decoder;
use crate::delta;
use crate::error::DisplayError;
use crate::frame::{FRAME_SIZE, ScreenFrame};
use crate::protocol::{FULL_FRAME_REQUEST, MessageType, SysexMessage};
use crate::sysex::SysexAssembler;
use bytes::Bytes;
use std::time::Duration;
use strum_macros::Display;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// How often the controller asks the device for a fresh full frame.
/// Requests go out on every tick whether or not replies arrive: a lost
/// request or reply heals itself on the next tick.
pub const REQUEST_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Outbound half of the MIDI transport collaborator.
pub trait MidiSender: Send + 'static {
    fn send(&mut self, bytes: &[u8]) -> Result<(), DisplayError>;
}

/// Synchronous decode core: SysEx reassembly, RLE decode, dispatch by
/// message type, and the canonical framebuffer.
#[derive(Debug, Default)]
pub struct ScreenDecoder {
    assembler: SysexAssembler,
    rle: Rle7Decoder,
    frame: ScreenFrame,
    state: ConnectionState,
}

impl ScreenDecoder {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Connecting,
            ..Self::default()
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The most recently decoded full frame (all dark until one lands).
    pub fn frame(&self) -> &ScreenFrame {
        &self.frame
    }

    /// Feed raw transport bytes; returns a snapshot for every full
    /// frame they completed.
    pub fn ingest(&mut self, bytes: &[u8]) -> Vec<ScreenFrame> {
        let mut frames = Vec::new();
        for msg in self.assembler.push(bytes) {
            if let Some(frame) = self.handle_message(msg) {
                frames.push(frame);
            }
        }
        frames
    }

    fn handle_message(&mut self, raw: Bytes) -> Option<ScreenFrame> {
        let msg = match SysexMessage::try_from(raw) {
            Ok(msg) => msg,
            Err(_) => {
                // foreign traffic is expected on a shared bus
                trace!("ignoring SysEx without Deluge signature");
                return None;
            }
        };
        match msg.message_type {
            MessageType::FullFrame => self.handle_full_frame(&msg.body),
            MessageType::Unknown(tag) => {
                trace!(tag, "unhandled Deluge message type");
                None
            }
        }
    }

    fn handle_full_frame(&mut self, body: &[u8]) -> Option<ScreenFrame> {
        let (raw, _) = self.rle.unpack(body, FRAME_SIZE);
        match ScreenFrame::from_bytes(&raw) {
            Ok(frame) => {
                self.frame = frame.clone();
                if self.state != ConnectionState::Connected {
                    info!("first full frame decoded, connected");
                    self.state = ConnectionState::Connected;
                }
                Some(frame)
            }
            Err(e) => {
                warn!(%e, "dropping full frame");
                None
            }
        }
    }

    /// Patch the current frame with a partial update.
    ///
    /// The firmware reserves a message type for these but has not been
    /// observed emitting it, so nothing routes here from [`ingest`]
    /// yet; the path is kept callable for when it does.
    ///
    /// [`ingest`]: Self::ingest
    pub fn apply_delta_message(&mut self, body: &[u8]) -> Result<(), DisplayError> {
        delta::apply_delta(body, &mut self.frame)
    }
}

/// Handle to a running display session.
///
/// Dropping the handle tears the worker down, discarding any in-flight
/// partial state.
pub struct DelugeSession {
    packet_tx: mpsc::UnboundedSender<Vec<u8>>,
    frame_rx: watch::Receiver<ScreenFrame>,
    state_rx: watch::Receiver<ConnectionState>,
    worker: JoinHandle<()>,
}

impl DelugeSession {
    /// Spawn the decode worker against the given transport sender.
    ///
    /// `endpoint` is the selected MIDI port name, kept for log context
    /// only; port discovery belongs to the transport collaborator.
    pub fn connect<S: MidiSender>(endpoint: &str, sender: S) -> Self {
        let (packet_tx, packet_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = watch::channel(ScreenFrame::default());
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        info!(endpoint, "starting Deluge display session");
        let worker = tokio::spawn(session_task(packet_rx, frame_tx, state_tx, sender));
        Self {
            packet_tx,
            frame_rx,
            state_rx,
            worker,
        }
    }

    /// Entry point for the transport delivery callback. Never blocks;
    /// bytes sent after shutdown are dropped.
    pub fn ingest(&self, bytes: &[u8]) {
        let _ = self.packet_tx.send(bytes.to_vec());
    }

    /// Watch the published framebuffer.
    pub fn frames(&self) -> watch::Receiver<ScreenFrame> {
        self.frame_rx.clone()
    }

    /// Watch connection-state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Tear the session down explicitly (dropping does the same).
    pub fn shutdown(self) {}
}

impl Drop for DelugeSession {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn session_task<S: MidiSender>(
    mut packet_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    frame_tx: watch::Sender<ScreenFrame>,
    state_tx: watch::Sender<ConnectionState>,
    mut sender: S,
) {
    let mut decoder = ScreenDecoder::new();
    let mut ticker = tokio::time::interval(REQUEST_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            packet = packet_rx.recv() => {
                let Some(packet) = packet else {
                    break;
                };
                for frame in decoder.ingest(&packet) {
                    frame_tx.send_replace(frame);
                }
                if *state_tx.borrow() != decoder.state() {
                    state_tx.send_replace(decoder.state());
                }
            }
            _ = ticker.tick() => {
                // fire and forget; the next tick retries regardless
                if let Err(e) = sender.send(&FULL_FRAME_REQUEST) {
                    warn!(%e, "full-frame request failed");
                }
            }
        }
    }

    state_tx.send_replace(ConnectionState::Disconnected);
    debug!("session worker stopped");
}
