use deluge_display_lib::frame::{SCREEN_HEIGHT, SCREEN_WIDTH};
use deluge_display_lib::{ConnectionState, DelugeSession, DisplayError, MidiSender, ScreenFrame};
use eframe::egui;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

const PIXEL_SCALE: f32 = 5.0;

/// Request sink: a replay has no live device to answer them.
struct NullSender;

impl MidiSender for NullSender {
    fn send(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        debug!(len = bytes.len(), "dropping outbound request (replay)");
        Ok(())
    }
}

struct DisplayApp {
    frames: watch::Receiver<ScreenFrame>,
    state: watch::Receiver<ConnectionState>,
    current: ScreenFrame,
}

impl DisplayApp {
    fn new(frames: watch::Receiver<ScreenFrame>, state: watch::Receiver<ConnectionState>) -> Self {
        Self {
            frames,
            state,
            current: ScreenFrame::default(),
        }
    }
}

impl eframe::App for DisplayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.frames.has_changed().unwrap_or(false) {
            self.current = self.frames.borrow_and_update().clone();
        }
        ctx.request_repaint_after(Duration::from_millis(50));

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Deluge Display");

            let state = *self.state.borrow();
            ui.horizontal(|ui| {
                ui.label("Status:");
                ui.colored_label(
                    if state == ConnectionState::Connected {
                        egui::Color32::GREEN
                    } else {
                        egui::Color32::RED
                    },
                    state.to_string(),
                );
            });

            ui.separator();

            let size = egui::vec2(
                SCREEN_WIDTH as f32 * PIXEL_SCALE,
                SCREEN_HEIGHT as f32 * PIXEL_SCALE,
            );
            let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
            painter.rect_filled(response.rect, egui::CornerRadius::ZERO, egui::Color32::BLACK);

            let origin = response.rect.min;
            for row in 0..SCREEN_HEIGHT {
                for col in 0..SCREEN_WIDTH {
                    if !self.current.pixel(col, row) {
                        continue;
                    }
                    let min = origin
                        + egui::vec2(col as f32 * PIXEL_SCALE, row as f32 * PIXEL_SCALE);
                    painter.rect_filled(
                        egui::Rect::from_min_size(min, egui::vec2(PIXEL_SCALE, PIXEL_SCALE)),
                        egui::CornerRadius::ZERO,
                        egui::Color32::WHITE,
                    );
                }
            }
        });
    }
}

/// Feed the capture into the session at MIDI-ish pacing, looping so the
/// viewer stays live.
async fn replay_task(path: PathBuf, session: DelugeSession) {
    let stream = match tokio::fs::read(&path).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("failed to read capture {}: {}", path.display(), e);
            return;
        }
    };
    if stream.is_empty() {
        error!("capture {} is empty", path.display());
        return;
    }
    info!(bytes = stream.len(), "replaying capture");

    loop {
        for packet in stream.chunks(64) {
            session.ingest(packet);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let Some(capture) = std::env::args().nth(1) else {
        eprintln!("usage: deluge-display-egui <capture-file>");
        std::process::exit(2);
    };

    let session = DelugeSession::connect("replay", NullSender);
    let frames = session.frames();
    let state = session.connection_state();

    // the task owns the session and keeps the worker alive
    tokio::spawn(replay_task(PathBuf::from(capture), session));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([
                SCREEN_WIDTH as f32 * PIXEL_SCALE + 40.0,
                SCREEN_HEIGHT as f32 * PIXEL_SCALE + 100.0,
            ])
            .with_title("Deluge Display"),
        ..Default::default()
    };

    let app = DisplayApp::new(frames, state);
    eframe::run_native("Deluge Display", options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}
