//! UCI engine plumbing: protocol decoding, win-probability scoring, and the
//! session actor that serializes commands to one engine worker.

pub mod cache;
pub mod process;
pub mod session;
pub mod uci;
pub mod win_chance;

pub use cache::{CacheEntry, CacheError, EngineCache};
pub use process::{find_stockfish_path, spawn_engine_process};
pub use session::{
    EngineIdentity, EngineSession, LineSink, SessionError, SessionOptions, SessionState,
    TrackedRequest,
};
pub use uci::{decode, BestMove, CandidateMove, EngineLine, EvaluationRecord, UciError, UciMessage};
pub use win_chance::{mate_win_chance, score_win_chance, win_chance};

use cozy_chess::Move;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Bidirectional line channel to an engine worker.
///
/// `tx` carries commands to the worker, `rx` carries the worker's output
/// lines. Closing either side ends the conversation.
pub struct EngineHandle {
    pub tx: mpsc::Sender<String>,
    pub rx: mpsc::Receiver<String>,
}

impl EngineHandle {
    /// Create a connected pair: the first end is for the session, the second
    /// for whatever plays the engine (a process bridge or a test double).
    pub fn duplex(buffer: usize) -> (EngineHandle, EngineHandle) {
        let (to_engine_tx, to_engine_rx) = mpsc::channel(buffer);
        let (from_engine_tx, from_engine_rx) = mpsc::channel(buffer);
        (
            EngineHandle {
                tx: to_engine_tx,
                rx: from_engine_rx,
            },
            EngineHandle {
                tx: from_engine_tx,
                rx: to_engine_rx,
            },
        )
    }
}

/// Engine analysis information, as parsed from one `info` line.
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<Move>, // Principal variation
    pub multipv: Option<u32>,
    pub currmove: Option<Move>,
    pub hashfull: Option<u16>,
    pub nps: Option<u64>,
    pub string: Option<String>,
}

/// Engine evaluation score, from the side to move's point of view.
///
/// Centipawns: positive = side-to-move is better.
/// Mate: positive N = side-to-move mates in N moves,
/// negative N = side-to-move gets mated in N moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    #[serde(rename = "cp")]
    Centipawns(i32),
    Mate(i32),
}

impl Score {
    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) => {
                if *m > 0 {
                    format!("+M{}", m)
                } else {
                    format!("-M{}", m.abs())
                }
            }
        }
    }

    /// Flip perspective.
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
