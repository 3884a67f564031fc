use cozy_chess::{Board, GameStatus, Move, Piece, Square};

use crate::converters::{
    char_to_file, char_to_rank, file_to_char, format_square, parse_square, piece_from_san_letter,
    rank_to_char, san_piece_letter,
};

/// All legal moves in a position, castling in cozy-chess king-takes-rook form.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

/// True if `mv` is a castling move in cozy-chess notation (king onto own rook).
pub fn is_castling(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move())
}

/// True if `mv` captures something, en passant included.
pub fn is_capture(board: &Board, mv: Move) -> bool {
    let side = board.side_to_move();
    if board.color_on(mv.to).is_some_and(|c| c != side) {
        return true;
    }
    board.piece_on(mv.from) == Some(Piece::Pawn) && mv.from.file() != mv.to.file()
}

/// Parse Standard Algebraic Notation (SAN) move against the legal moves of `board`.
///
/// Accepts check/mate markers, annotation glyphs, `0-0` castling and
/// over-specified disambiguation.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let text = normalize_san(san);
    if text.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let legal = legal_moves(board);

    if text == "O-O" || text == "O-O-O" {
        let kingside = text == "O-O";
        return legal
            .into_iter()
            .find(|&mv| {
                is_castling(board, mv)
                    && ((mv.to.file() as u8 > mv.from.file() as u8) == kingside)
            })
            .ok_or_else(|| SanError::NoLegalMove(san.to_string()));
    }

    let (body, promotion) = split_promotion(&text, san)?;

    let mut chars: Vec<char> = body.chars().filter(|c| *c != 'x' && *c != '-').collect();
    let piece = match chars.first().copied().and_then(piece_from_san_letter) {
        Some(p) => {
            chars.remove(0);
            p
        }
        None => Piece::Pawn,
    };

    if chars.len() < 2 {
        return Err(SanError::InvalidFormat(san.to_string()));
    }
    let target_text: String = chars[chars.len() - 2..].iter().collect();
    let target =
        parse_square(&target_text).ok_or_else(|| SanError::InvalidSquare(target_text.clone()))?;

    let mut from_file = None;
    let mut from_rank = None;
    for &c in &chars[..chars.len() - 2] {
        if let Some(f) = char_to_file(c) {
            from_file = Some(f);
        } else if let Some(r) = char_to_rank(c) {
            from_rank = Some(r);
        } else {
            return Err(SanError::InvalidFormat(san.to_string()));
        }
    }

    let mut candidates = legal.into_iter().filter(|&mv| {
        mv.to == target
            && board.piece_on(mv.from) == Some(piece)
            && !is_castling(board, mv)
            && mv.promotion == promotion
            && from_file.map_or(true, |f| mv.from.file() == f)
            && from_rank.map_or(true, |r| mv.from.rank() == r)
    });

    let first = candidates
        .next()
        .ok_or_else(|| SanError::NoLegalMove(san.to_string()))?;
    if candidates.next().is_some() {
        return Err(SanError::AmbiguousMove(san.to_string()));
    }
    Ok(first)
}

/// Format a move as SAN, including disambiguation and check/mate suffixes.
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return format!("{}{}", format_square(mv.from), format_square(mv.to));
    };

    let mut san = String::new();
    if is_castling(board, mv) {
        if mv.to.file() as u8 > mv.from.file() as u8 {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let capture = is_capture(board, mv);
        match san_piece_letter(piece) {
            Some(letter) => {
                san.push(letter);
                san.push_str(&disambiguation(board, mv, piece));
            }
            None if capture => san.push(file_to_char(mv.from.file())),
            None => {}
        }
        if capture {
            san.push('x');
        }
        san.push_str(&format_square(mv.to));
        if let Some(letter) = mv.promotion.and_then(san_piece_letter) {
            san.push('=');
            san.push(letter);
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        if after.status() == GameStatus::Won {
            san.push('#');
        } else {
            san.push('+');
        }
    }

    san
}

fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    if piece == Piece::King {
        return String::new();
    }

    let rivals: Vec<Square> = legal_moves(board)
        .into_iter()
        .filter(|m| m.to == mv.to && m.from != mv.from && board.piece_on(m.from) == Some(piece))
        .map(|m| m.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());

    if !shares_file {
        file_to_char(mv.from.file()).to_string()
    } else if !shares_rank {
        rank_to_char(mv.from.rank()).to_string()
    } else {
        format_square(mv.from)
    }
}

fn normalize_san(san: &str) -> String {
    let trimmed = san
        .trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .trim_end_matches("e.p.")
        .trim();
    match trimmed {
        "0-0" => "O-O".to_string(),
        "0-0-0" => "O-O-O".to_string(),
        other => other.to_string(),
    }
}

fn split_promotion<'a>(text: &'a str, san: &str) -> Result<(&'a str, Option<Piece>), SanError> {
    if let Some((body, promo)) = text.split_once('=') {
        let piece = promo
            .chars()
            .next()
            .and_then(piece_from_san_letter)
            .filter(|p| *p != Piece::King)
            .ok_or_else(|| SanError::InvalidPromotion(san.to_string()))?;
        return Ok((body, Some(piece)));
    }

    // Some exporters write "e8Q" without the '='.
    let last = text.chars().last();
    if let Some(piece) = last.and_then(piece_from_san_letter) {
        let starts_lower = text.chars().next().is_some_and(|c| c.is_ascii_lowercase());
        if starts_lower && piece != Piece::King {
            return Ok((&text[..text.len() - 1], Some(piece)));
        }
    }

    Ok((text, None))
}

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}
