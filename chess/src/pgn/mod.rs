pub mod parser;
pub mod san;

pub use parser::{parse_pgn, GameResult, PgnError, PgnGame, PgnMove};
pub use san::{format_san, is_capture, is_castling, legal_moves, parse_san, SanError};
