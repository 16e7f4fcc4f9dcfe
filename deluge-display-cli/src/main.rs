use anyhow::{Context, Result};
use clap::Parser;
use deluge_display_lib::ScreenDecoder;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Offline decoder for captured Deluge display traffic.
///
/// Reads a raw MIDI byte stream as recorded from the Deluge's SysEx
/// port and prints every reconstructed OLED frame as ASCII art.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Capture file: raw MIDI bytes, or a hex dump with --hex.
    capture: PathBuf,

    /// Treat the capture as whitespace-separated hex instead of raw bytes.
    #[arg(long)]
    hex: bool,

    /// Print only the final frame of the capture.
    #[arg(long)]
    last_only: bool,

    /// Feed the stream in chunks of this many bytes.
    #[arg(long, default_value_t = 256)]
    chunk_size: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let raw = fs::read(&cli.capture)
        .with_context(|| format!("reading {}", cli.capture.display()))?;
    let stream = if cli.hex {
        let text = String::from_utf8(raw).context("hex capture is not valid UTF-8")?;
        let compact: String = text.split_whitespace().collect();
        hex::decode(&compact).context("invalid hex in capture")?
    } else {
        raw
    };

    let mut decoder = ScreenDecoder::new();
    let mut frames = Vec::new();
    for chunk in stream.chunks(cli.chunk_size.max(1)) {
        frames.extend(decoder.ingest(chunk));
    }

    if frames.is_empty() {
        println!("no complete frames in capture");
        return Ok(());
    }

    println!(
        "decoded {} frame(s), session state: {}",
        frames.len(),
        decoder.state()
    );
    if cli.last_only {
        if let Some(frame) = frames.last() {
            print!("{}", frame.to_ascii());
        }
    } else {
        for (i, frame) in frames.iter().enumerate() {
            println!("--- frame {} ---", i + 1);
            print!("{}", frame.to_ascii());
        }
    }
    Ok(())
}
