pub mod codec;
pub mod delta;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod session;
pub mod sysex;

// Re-export the pieces most callers need
pub use error::DisplayError;
pub use frame::ScreenFrame;
pub use session::{ConnectionState, DelugeSession, MidiSender, ScreenDecoder};
