//! Engine session actor.
//!
//! One session owns one engine worker channel. Commands are queued FIFO and
//! dispatched one at a time; a command submitted with a [`LineSink`] stays in
//! flight until the engine prints `bestmove`, and every line received in the
//! meantime is forwarded to that sink verbatim.

mod actor;
mod handle;
mod handshake;

pub use handle::{EngineSession, TrackedRequest};
pub use handshake::EngineIdentity;

use std::time::Duration;
use tokio::sync::mpsc;

/// Receives raw engine lines for one command. Dropped by the session once the
/// command completes or the session terminates.
pub type LineSink = mpsc::UnboundedSender<String>;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    /// Handshake in flight.
    Initializing,
    /// Idle, waiting for a command.
    Ready,
    /// A command with a line sink is in flight.
    Busy,
    Terminated,
}

/// Options applied during the handshake.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub move_overhead_ms: Option<u32>,
    pub skill_level: Option<u8>,
    /// Number of candidate lines (MultiPV).
    pub multipv: u32,
    /// Search threads; only sent when the engine advertises a `Threads` option.
    pub threads: u32,
    pub hash_mb: Option<u32>,
    pub handshake_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            move_overhead_ms: Some(10),
            skill_level: Some(20),
            multipv: 1,
            threads: 1,
            hash_mb: None,
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Engine not found")]
    EngineNotFound,
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Engine closed during handshake")]
    HandshakeClosed,
    #[error("Timeout waiting for engine to respond ({0})")]
    HandshakeTimeout(&'static str),
    #[error("Engine session terminated")]
    Terminated,
}
