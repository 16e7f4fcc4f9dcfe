//! Replay a captured Deluge byte stream through the live session
//! pipeline, printing frames as the worker publishes them.

use anyhow::{Context, Result};
use clap::Parser;
use deluge_display_lib::{DelugeSession, DisplayError, MidiSender};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Capture file of raw MIDI bytes.
    capture: PathBuf,

    /// Milliseconds between injected packets.
    #[arg(long, default_value_t = 10)]
    pace_ms: u64,

    /// Bytes per injected packet.
    #[arg(long, default_value_t = 64)]
    packet_size: usize,
}

/// Request sink: a replay has no live device to answer them.
struct NullSender;

impl MidiSender for NullSender {
    fn send(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        debug!(len = bytes.len(), "dropping outbound request (replay)");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let stream = std::fs::read(&cli.capture)
        .with_context(|| format!("reading {}", cli.capture.display()))?;

    let session = DelugeSession::connect("replay", NullSender);
    let mut frames = session.frames();

    let mut printed = 0usize;
    for packet in stream.chunks(cli.packet_size.max(1)) {
        session.ingest(packet);
        tokio::time::sleep(Duration::from_millis(cli.pace_ms)).await;
        while frames.has_changed()? {
            let frame = frames.borrow_and_update().clone();
            printed += 1;
            print!("{}", frame.to_ascii());
        }
    }

    let state_rx = session.connection_state();
    let state = *state_rx.borrow();
    info!(frames = printed, %state, "replay finished");
    Ok(())
}
