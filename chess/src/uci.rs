//! UCI (Universal Chess Interface) move notation utilities

use cozy_chess::{File, Move, Piece, Rank, Square};

use crate::converters::{format_piece, format_square, parse_square};

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// The converted move is only returned if it is in `legal_moves`.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_rank_1_or_8 = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_rank_1_or_8 && is_e_file && is_g_or_c_file && mv.promotion.is_none() {
        let rook_file = if mv.to.file() == File::G { File::H } else { File::A };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };

        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

/// Convert a cozy_chess castling move (king takes own rook) to the square the
/// king actually lands on: e1h1 → e1g1, e1a1 → e1c1.
///
/// Callers must only pass moves already known to be castling.
pub fn castling_king_destination(mv: Move) -> Square {
    let file = if mv.to.file() as u8 > mv.from.file() as u8 {
        File::G
    } else {
        File::C
    };
    Square::new(file, mv.from.rank())
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

/// Parse UCI move format (e2e4, e7e8q). Castling stays in standard notation;
/// see [`convert_uci_castling_to_cozy`].
pub fn parse_uci_move(s: &str) -> Option<Move> {
    if !(4..=5).contains(&s.len()) || !s.is_ascii() {
        return None;
    }

    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;

    let promotion = match s.get(4..5) {
        None => None,
        Some("q") => Some(Piece::Queen),
        Some("r") => Some(Piece::Rook),
        Some("b") => Some(Piece::Bishop),
        Some("n") => Some(Piece::Knight),
        Some(_) => return None,
    };

    Some(Move {
        from,
        to,
        promotion,
    })
}
