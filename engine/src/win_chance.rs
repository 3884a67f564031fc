//! Logistic mapping from engine scores to a winning chance.
//!
//! All values are White's winning chance in percent. Engines report scores
//! from the side to move's point of view, so every function takes the side to
//! move of the evaluated position.

use crate::Score;

/// Slope of the logistic curve, per centipawn.
pub const LOGISTIC_K: f64 = 0.00368208;

/// Winning chance for a centipawn score.
///
/// `50 + 50 * (2 / (1 + e^(-k * cp)) - 1)` with `cp` flipped when Black is to
/// move. Equal positions map to exactly 50.
pub fn win_chance(centipawns: i32, white_to_move: bool) -> f64 {
    let signed = if white_to_move {
        centipawns as f64
    } else {
        -(centipawns as f64)
    };
    let chance = 50.0 + 50.0 * (2.0 / (1.0 + (-LOGISTIC_K * signed).exp()) - 1.0);
    chance.clamp(0.0, 100.0)
}

/// Winning chance for a forced mate: always exactly 0 or 100.
///
/// Positive `mate` means the side to move delivers mate; zero or negative
/// means the side to move is (being) mated.
pub fn mate_win_chance(mate: i32, white_to_move: bool) -> f64 {
    let side_to_move_wins = mate > 0;
    if side_to_move_wins == white_to_move {
        100.0
    } else {
        0.0
    }
}

pub fn score_win_chance(score: Score, white_to_move: bool) -> f64 {
    match score {
        Score::Centipawns(cp) => win_chance(cp, white_to_move),
        Score::Mate(m) => mate_win_chance(m, white_to_move),
    }
}
