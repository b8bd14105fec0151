//! tmux-backed terminal session management: lifecycle, output capture and
//! parsing, the input lock, and on-disk persistence for daemon-restart
//! rediscovery.

pub mod bridge;
pub mod error;
pub mod handle;
pub mod input_queue;
pub mod parser;
pub mod ring_buffer;
pub mod terminal;
pub mod terminal_persistence;
pub mod tmux;

pub use bridge::SessionBridge;
pub use error::{SessionError, Result};
pub use terminal::{TerminalRegistry, TerminalState};
