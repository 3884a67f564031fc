//! Chess rules capability for movegrade.
//!
//! Wraps cozy-chess with PGN/SAN handling and a replayable [`Game`] that
//! records full metadata for every ply.

pub mod converters;
pub mod fen;
pub mod game;
pub mod pgn;
pub mod types;
pub mod uci;

pub use fen::{side_to_move, FenError, START_FEN};
pub use game::{Game, GameError, PlayedMove, StartPosition};
pub use pgn::{parse_pgn, GameResult, PgnError, PgnGame, SanError};
pub use types::{PieceColor, PieceKind};
pub use uci::{convert_uci_castling_to_cozy, format_uci_move, parse_uci_move};
