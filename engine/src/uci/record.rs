//! Typed evaluation data decoded from engine output.

use serde::{Deserialize, Serialize};

use crate::win_chance::score_win_chance;
use crate::{EngineInfo, Score};

/// First move of a principal variation, split for arrow drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMove {
    /// Full coordinate move, promotion suffix included ("e7e8q").
    pub uci: String,
    pub from: String,
    pub to: String,
}

impl CandidateMove {
    /// Build from a coordinate move string; `None` unless it is a valid move.
    pub fn from_uci(uci: &str) -> Option<Self> {
        chess::parse_uci_move(uci)?;
        Some(Self {
            uci: uci.to_string(),
            from: uci[0..2].to_string(),
            to: uci[2..4].to_string(),
        })
    }
}

/// One decoded search step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub depth: u32,
    pub seldepth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Score,
    /// White's winning chance in percent, derived from `score`.
    pub win_chance: f64,
    pub best_move: Option<CandidateMove>,
    pub pv: Vec<String>,
}

impl EvaluationRecord {
    /// Convert a parsed `info` line. Lines without a score carry nothing to
    /// evaluate and yield `None`.
    pub fn from_info(info: &EngineInfo, white_to_move: bool) -> Option<Self> {
        let score = info.score?;
        let pv: Vec<String> = info.pv.iter().map(|mv| chess::format_uci_move(*mv)).collect();
        let best_move = pv.first().and_then(|uci| CandidateMove::from_uci(uci));

        Some(Self {
            depth: info.depth.unwrap_or(0),
            seldepth: info.seldepth,
            multipv: info.multipv,
            score,
            win_chance: score_win_chance(score, white_to_move),
            best_move,
            pv,
        })
    }

    /// Evaluation in pawns, for centipawn scores.
    pub fn eval(&self) -> Option<f64> {
        match self.score {
            Score::Centipawns(cp) => Some(cp as f64 / 100.0),
            Score::Mate(_) => None,
        }
    }

    pub fn mate(&self) -> Option<i32> {
        match self.score {
            Score::Mate(m) => Some(m),
            Score::Centipawns(_) => None,
        }
    }

    /// Candidate line rank, 1 when the engine did not report one.
    pub fn rank(&self) -> u32 {
        self.multipv.unwrap_or(1)
    }
}

/// The terminal `bestmove` line of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestMove {
    /// `None` for `bestmove (none)`, sent when the position has no legal move.
    pub best: Option<CandidateMove>,
    pub ponder: Option<CandidateMove>,
}
