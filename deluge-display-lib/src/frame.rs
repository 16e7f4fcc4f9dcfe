use crate::error::DisplayError;
use std::fmt;

/// Display width in pixels (one byte column per pixel column).
pub const SCREEN_WIDTH: usize = 128;

/// Number of vertical 8-pixel blocks.
pub const BLOCKS_HIGH: usize = 6;

/// Display height in pixels.
pub const SCREEN_HEIGHT: usize = BLOCKS_HIGH * 8;

/// Size of one complete frame in bytes.
pub const FRAME_SIZE: usize = SCREEN_WIDTH * BLOCKS_HIGH;

/// One complete monochrome OLED frame, stored exactly as carried on the
/// wire: byte `block * 128 + col` holds the 8 pixels of column `col` in
/// block `block`, least significant bit on top.
///
/// The wire orientation is part of the protocol; [`ScreenFrame::pixel`]
/// translates it for renderers instead of rewriting the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ScreenFrame {
    data: [u8; FRAME_SIZE],
}

impl Default for ScreenFrame {
    fn default() -> Self {
        Self {
            data: [0; FRAME_SIZE],
        }
    }
}

impl fmt::Debug for ScreenFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit: usize = self.data.iter().map(|b| b.count_ones() as usize).sum();
        write!(f, "ScreenFrame({SCREEN_WIDTH}x{SCREEN_HEIGHT}, {lit} lit)")
    }
}

impl ScreenFrame {
    /// Build a frame from decoded bytes; anything but exactly
    /// [`FRAME_SIZE`] bytes is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DisplayError> {
        if bytes.len() != FRAME_SIZE {
            return Err(DisplayError::InvalidFrameSize {
                expected: FRAME_SIZE,
                actual: bytes.len(),
            });
        }
        let mut data = [0u8; FRAME_SIZE];
        data.copy_from_slice(bytes);
        Ok(Self { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Whether the pixel at `col`/`row` (origin top-left) is lit.
    pub fn pixel(&self, col: usize, row: usize) -> bool {
        debug_assert!(col < SCREEN_WIDTH && row < SCREEN_HEIGHT);
        let byte = self.data[(row / 8) * SCREEN_WIDTH + col];
        byte & (1 << (row % 8)) != 0
    }

    /// Render the frame as ASCII art, one text row per pixel row.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((SCREEN_WIDTH + 1) * SCREEN_HEIGHT);
        for row in 0..SCREEN_HEIGHT {
            for col in 0..SCREEN_WIDTH {
                out.push(if self.pixel(col, row) { '#' } else { ' ' });
            }
            out.push('\n');
        }
        out
    }
}
