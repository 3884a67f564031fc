use cozy_chess::{Board, Color, GameStatus, Move};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::converters::format_square;
use crate::fen::{format_fen, parse_fen, FenError, START_FEN};
use crate::pgn::{self, GameResult, PgnError, SanError};
use crate::types::{PieceColor, PieceKind};
use crate::uci::{castling_king_destination, convert_uci_castling_to_cozy, format_uci_move, parse_uci_move};

/// Game state wrapper around a cozy-chess Board with full move history.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<PlayedMove>,
    moves: Vec<Move>,
    tags: BTreeMap<String, String>,
    start_position: StartPosition,
}

/// One ply as played, with everything a consumer needs to display or
/// evaluate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayedMove {
    /// 1-based ply number.
    pub ply: u32,
    pub color: PieceColor,
    pub san: String,
    /// Standard UCI notation; castling is written as the king's two-square move.
    pub uci: String,
    pub from: String,
    pub to: String,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub is_castle: bool,
    pub is_check: bool,
    pub fen_before: String,
    pub fen_after: String,
}

/// Starting position of the game
#[derive(Debug, Clone)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            history: Vec::new(),
            moves: Vec::new(),
            tags: BTreeMap::new(),
            start_position: StartPosition::Standard,
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let position = parse_fen(fen)?;
        Ok(Self {
            position,
            history: Vec::new(),
            moves: Vec::new(),
            tags: BTreeMap::new(),
            start_position: StartPosition::Fen(fen.trim().to_string()),
        })
    }

    /// Replay the first game of a PGN string.
    ///
    /// Honors a `FEN` tag as the starting position. Fails on the first move
    /// that is illegal or unparseable; no partial game is returned.
    pub fn from_pgn(input: &str) -> Result<Self, GameError> {
        let parsed = pgn::parse_pgn(input)?;

        let mut game = match parsed.tags.get("FEN") {
            Some(fen) => Self::from_fen(fen)?,
            None => Self::new(),
        };
        game.tags = parsed.tags;
        if !game.tags.contains_key("Result") {
            game.tags
                .insert("Result".to_string(), parsed.result.as_token().to_string());
        }

        for pgn_move in &parsed.moves {
            game.make_san_move(&pgn_move.san)?;
        }

        Ok(game)
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    /// Get the move history
    pub fn history(&self) -> &[PlayedMove] {
        &self.history
    }

    /// Value of a PGN tag pair, e.g. `header("White")`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.tags.insert(name.to_string(), value.to_string());
    }

    pub fn start_fen(&self) -> &str {
        match &self.start_position {
            StartPosition::Standard => START_FEN,
            StartPosition::Fen(fen) => fen,
        }
    }

    pub fn result(&self) -> GameResult {
        self.header("Result")
            .and_then(GameResult::from_token)
            .unwrap_or_default()
    }

    /// Make a move on the board
    pub fn make_move(&mut self, mv: Move) -> Result<PlayedMove, GameError> {
        let legal = self.legal_moves();
        if !legal.contains(&mv) {
            return Err(GameError::IllegalMove(format_uci_move(mv)));
        }

        let board = &self.position;
        let piece = board
            .piece_on(mv.from)
            .ok_or_else(|| GameError::IllegalMove(format_uci_move(mv)))?;
        let color = board.side_to_move();
        let is_castle = pgn::is_castling(board, mv);
        let captured = if is_castle {
            None
        } else if let Some(target) = board.piece_on(mv.to) {
            Some(PieceKind::from(target))
        } else if pgn::is_capture(board, mv) {
            Some(PieceKind::Pawn) // en passant
        } else {
            None
        };

        let san = pgn::format_san(board, mv);
        let fen_before = format_fen(board);

        let mut next = board.clone();
        next.play_unchecked(mv);
        let is_check = !next.checkers().is_empty();
        let fen_after = format_fen(&next);

        let to = if is_castle {
            castling_king_destination(mv)
        } else {
            mv.to
        };
        let uci = format_uci_move(Move { to, ..mv });

        let entry = PlayedMove {
            ply: self.history.len() as u32 + 1,
            color: color.into(),
            san,
            uci,
            from: format_square(mv.from),
            to: format_square(to),
            piece: piece.into(),
            captured,
            promotion: mv.promotion.map(PieceKind::from),
            is_castle,
            is_check,
            fen_before,
            fen_after,
        };

        self.position = next;
        self.moves.push(mv);
        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Play a move given in SAN.
    pub fn make_san_move(&mut self, san: &str) -> Result<PlayedMove, GameError> {
        let ply = self.history.len() as u32 + 1;
        let mv = pgn::parse_san(&self.position, san).map_err(|source| GameError::San { ply, source })?;
        self.make_move(mv)
    }

    /// Play a move given in UCI notation (standard castling accepted).
    pub fn make_uci_move(&mut self, uci: &str) -> Result<PlayedMove, GameError> {
        let mv = parse_uci_move(uci).ok_or_else(|| GameError::IllegalMove(uci.to_string()))?;
        let mv = convert_uci_castling_to_cozy(mv, &self.legal_moves());
        self.make_move(mv)
    }

    /// Undo the last move
    pub fn undo(&mut self) -> Result<PlayedMove, GameError> {
        let entry = self.history.pop().ok_or(GameError::NothingToUndo)?;
        self.moves.pop();
        self.rebuild_position()?;
        Ok(entry)
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        pgn::legal_moves(&self.position)
    }

    /// Get the current game status
    pub fn status(&self) -> GameStatus {
        self.position.status()
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        format_fen(&self.position)
    }

    /// Rebuild position from start + history (for undo)
    fn rebuild_position(&mut self) -> Result<(), GameError> {
        let mut board = match &self.start_position {
            StartPosition::Standard => Board::default(),
            StartPosition::Fen(fen) => parse_fen(fen)?,
        };

        for &mv in &self.moves {
            board
                .try_play(mv)
                .map_err(|_| GameError::IllegalMove(format_uci_move(mv)))?;
        }

        self.position = board;
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Move {ply}: {source}")]
    San {
        ply: u32,
        #[source]
        source: SanError,
    },
    #[error("FEN parse error: {0}")]
    Fen(#[from] FenError),
    #[error("PGN parse error: {0}")]
    Pgn(#[from] PgnError),
}
