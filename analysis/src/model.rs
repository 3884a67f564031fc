//! Analysis data model.

use std::collections::BTreeMap;
use std::time::Duration;

use chess::{Game, PlayedMove};
use engine::EvaluationRecord;
use serde::{Deserialize, Serialize};

/// Quality label for a played move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// No baseline, missing data, or the move gained.
    None,
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    /// Reserved; never assigned by [`crate::classify`].
    Brilliant,
    /// Reserved; never assigned by [`crate::classify`].
    Forced,
}

impl Classification {
    pub const ALL: [Classification; 9] = [
        Self::None,
        Self::Best,
        Self::Excellent,
        Self::Good,
        Self::Inaccuracy,
        Self::Mistake,
        Self::Blunder,
        Self::Brilliant,
        Self::Forced,
    ];

    /// NAG (Numeric Annotation Glyph) for PGN export.
    pub fn to_nag(self) -> Option<u8> {
        match self {
            Self::Brilliant => Some(3), // !!
            Self::Excellent => Some(1), // !
            Self::Inaccuracy => Some(6), // ?!
            Self::Mistake => Some(2),   // ?
            Self::Blunder => Some(4),   // ??
            Self::None | Self::Best | Self::Good | Self::Forced => None,
        }
    }

    /// Square highlight colour for board consumers.
    pub fn highlight_color(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Brilliant => Some("#1baca6"),
            Self::Best => Some("#5c8bb0"),
            Self::Excellent => Some("#96bc4b"),
            Self::Good => Some("#97af8b"),
            Self::Inaccuracy => Some("#f0c15c"),
            Self::Mistake => Some("#e58f2a"),
            Self::Blunder => Some("#ca3431"),
            Self::Forced => Some("#a0a0a0"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Best => "Best",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Inaccuracy => "Inaccuracy",
            Self::Mistake => "Mistake",
            Self::Blunder => "Blunder",
            Self::Brilliant => "Brilliant",
            Self::Forced => "Forced",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One position to evaluate: the move about to be played and the FEN before it.
#[derive(Debug, Clone)]
pub struct PlyInput {
    pub index: usize,
    pub fen: String,
    pub played: PlayedMove,
}

impl PlyInput {
    /// One input per move of a replayed game, in move order.
    pub fn from_game(game: &Game) -> Vec<Self> {
        game.history()
            .iter()
            .enumerate()
            .map(|(index, played)| Self {
                index,
                fen: played.fen_before.clone(),
                played: played.clone(),
            })
            .collect()
    }
}

/// Per-move result: the position before the move and what the engine said
/// about it. The first record is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedMove {
    pub index: usize,
    #[serde(rename = "move")]
    pub played: PlayedMove,
    pub fen: String,
    pub records: Vec<EvaluationRecord>,
    #[serde(default)]
    pub classification: Option<Classification>,
}

impl AnalyzedMove {
    pub fn new(input: PlyInput, records: Vec<EvaluationRecord>) -> Self {
        Self {
            index: input.index,
            played: input.played,
            fen: input.fen,
            records,
            classification: None,
        }
    }

    pub fn best(&self) -> Option<&EvaluationRecord> {
        self.records.first()
    }

    /// White's win chance from the authoritative record.
    pub fn win_chance(&self) -> Option<f64> {
        self.best().map(|r| r.win_chance)
    }

    pub fn is_evaluated(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Completion counter handed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100) / self.total).min(100) as u8
    }
}

/// Search constraints for each position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettings {
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
    /// Candidate lines per position (MultiPV).
    pub variants: u32,
    pub threads: u32,
    pub idle_timeout_ms: u64,
}

pub const DEFAULT_DEPTH: u32 = 18;
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 1000;

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            depth: Some(DEFAULT_DEPTH),
            movetime_ms: None,
            variants: 1,
            threads: 1,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

impl SearchSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// The `go` command for one position. Depth wins over movetime.
    pub fn go_command(&self) -> String {
        match (self.depth, self.movetime_ms) {
            (Some(depth), _) => format!("go depth {}", depth),
            (None, Some(ms)) => format!("go movetime {}", ms),
            (None, None) => format!("go depth {}", DEFAULT_DEPTH),
        }
    }
}

/// What the caller asks for when starting an analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub search: SearchSettings,
}

/// Game metadata pulled from the PGN tag pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameHeaders {
    pub white: Option<String>,
    pub black: Option<String>,
    pub white_elo: Option<u32>,
    pub black_elo: Option<u32>,
    pub result: Option<String>,
    pub date: Option<String>,
    pub event: Option<String>,
    /// Every other tag pair, verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, String>,
}

const KNOWN_TAGS: [&str; 7] = ["White", "Black", "WhiteElo", "BlackElo", "Result", "Date", "Event"];

impl GameHeaders {
    pub fn from_tags(tags: &BTreeMap<String, String>) -> Self {
        let text = |name: &str| {
            tags.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty() && *v != "?")
                .map(str::to_string)
        };
        let elo = |name: &str| text(name).and_then(|v| v.parse().ok());

        Self {
            white: text("White"),
            black: text("Black"),
            white_elo: elo("WhiteElo"),
            black_elo: elo("BlackElo"),
            result: text("Result"),
            date: text("Date"),
            event: text("Event"),
            other: tags
                .iter()
                .filter(|(k, _)| !KNOWN_TAGS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// "White vs Black", with placeholders for unknown players.
    pub fn title(&self) -> String {
        format!(
            "{} vs {}",
            self.white.as_deref().unwrap_or("?"),
            self.black.as_deref().unwrap_or("?")
        )
    }
}

/// Aggregate root: one analysed game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: String,
    pub pgn: String,
    pub headers: GameHeaders,
    pub variants: u32,
    pub search: SearchSettings,
    pub moves: Vec<AnalyzedMove>,
    pub created_at: u64,
}

impl Analysis {
    pub fn new(
        pgn: String,
        headers: GameHeaders,
        search: SearchSettings,
        moves: Vec<AnalyzedMove>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pgn,
            headers,
            variants: search.variants,
            search,
            moves,
            created_at: crate::store::now_timestamp(),
        }
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    /// Grade of move `index`. It lives on the following entry, whose
    /// position the move produced; the last move has none.
    pub fn grade_of(&self, index: usize) -> Option<Classification> {
        self.moves.get(index + 1)?.classification
    }

    /// Moves the engine had nothing to say about.
    pub fn missing_evaluations(&self) -> usize {
        self.moves.iter().filter(|m| !m.is_evaluated()).count()
    }
}
