//! Move classification from consecutive win chances.
//!
//! Entry `i` holds the position before move `i`, so the step from entry
//! `i - 1` to entry `i` is the effect of move `i - 1`. That step is graded
//! from the point of view of whoever played it and the label is stored on
//! entry `i`. Entry 0 has no baseline.

use std::collections::HashMap;

use chess::PieceColor;

use crate::model::{AnalyzedMove, Classification};

/// Label every move. Order is preserved; earlier labels are overwritten.
pub fn classify(mut moves: Vec<AnalyzedMove>) -> Vec<AnalyzedMove> {
    let labels: Vec<Classification> = (0..moves.len())
        .map(|i| {
            if i == 0 {
                Classification::None
            } else {
                classify_step(&moves[i - 1], &moves[i])
            }
        })
        .collect();

    for (analyzed, label) in moves.iter_mut().zip(labels) {
        analyzed.classification = Some(label);
    }
    moves
}

fn classify_step(prev: &AnalyzedMove, curr: &AnalyzedMove) -> Classification {
    let (Some(before), Some(after)) = (prev.win_chance(), curr.win_chance()) else {
        return Classification::None;
    };
    let mover = prev.played.color;
    classify_drop(mover_view(before, mover), mover_view(after, mover))
}

/// Stored win chances are White's.
fn mover_view(white_chance: f64, mover: PieceColor) -> f64 {
    match mover {
        PieceColor::White => white_chance,
        PieceColor::Black => 100.0 - white_chance,
    }
}

/// Grade the mover's win chance before and after their move, both in
/// percent from the mover's side. The drop is rounded to whole points.
pub fn classify_drop(before: f64, after: f64) -> Classification {
    let drop = (before - after).round() as i64;
    match drop {
        0 => Classification::Best,
        1..=2 => Classification::Excellent,
        3..=5 => Classification::Good,
        6..=10 => Classification::Inaccuracy,
        11..=20 => Classification::Mistake,
        21..=100 => Classification::Blunder,
        _ => Classification::None,
    }
}

/// Label counts for one side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideSummary {
    counts: HashMap<Classification, usize>,
}

impl SideSummary {
    pub fn count(&self, label: Classification) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationSummary {
    pub white: SideSummary,
    pub black: SideSummary,
}

impl ClassificationSummary {
    pub fn side(&self, color: PieceColor) -> &SideSummary {
        match color {
            PieceColor::White => &self.white,
            PieceColor::Black => &self.black,
        }
    }
}

/// Count labels per side. A label is credited to the player whose move it
/// grades; unclassified entries are skipped.
pub fn summarize(moves: &[AnalyzedMove]) -> ClassificationSummary {
    let mut summary = ClassificationSummary::default();
    for pair in moves.windows(2) {
        let Some(label) = pair[1].classification else {
            continue;
        };
        let side = match pair[0].played.color {
            PieceColor::White => &mut summary.white,
            PieceColor::Black => &mut summary.black,
        };
        *side.counts.entry(label).or_insert(0) += 1;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{PieceKind, PlayedMove};
    use engine::{EvaluationRecord, Score};

    fn record(win_chance: f64) -> EvaluationRecord {
        EvaluationRecord {
            depth: 20,
            seldepth: None,
            multipv: Some(1),
            score: Score::Centipawns(0),
            win_chance,
            best_move: None,
            pv: vec![],
        }
    }

    fn analyzed(index: usize, win_chance: Option<f64>) -> AnalyzedMove {
        let color = if index % 2 == 0 {
            PieceColor::White
        } else {
            PieceColor::Black
        };
        AnalyzedMove {
            index,
            played: PlayedMove {
                ply: index as u32 + 1,
                color,
                san: "e4".to_string(),
                uci: "e2e4".to_string(),
                from: "e2".to_string(),
                to: "e4".to_string(),
                piece: PieceKind::Pawn,
                captured: None,
                promotion: None,
                is_castle: false,
                is_check: false,
                fen_before: String::new(),
                fen_after: String::new(),
            },
            fen: String::new(),
            records: win_chance.map(record).into_iter().collect(),
            classification: None,
        }
    }

    fn labels(chances: &[Option<f64>]) -> Vec<Classification> {
        let moves = chances
            .iter()
            .enumerate()
            .map(|(i, c)| analyzed(i, *c))
            .collect();
        classify(moves)
            .into_iter()
            .map(|m| m.classification.unwrap())
            .collect()
    }

    #[test]
    fn test_first_move_has_no_baseline() {
        assert_eq!(labels(&[Some(50.0)]), [Classification::None]);
        assert!(classify(vec![]).is_empty());
    }

    #[test]
    fn test_unchanged_is_best() {
        assert_eq!(labels(&[Some(70.0), Some(70.0)])[1], Classification::Best);
    }

    #[test]
    fn test_twenty_point_drop_is_mistake() {
        assert_eq!(labels(&[Some(70.0), Some(50.0)])[1], Classification::Mistake);
    }

    #[test]
    fn test_thirty_point_drop_is_blunder() {
        assert_eq!(labels(&[Some(70.0), Some(40.0)])[1], Classification::Blunder);
    }

    #[test]
    fn test_black_mover_is_normalized() {
        // White's chance going 30 -> 50 after Black's move is Black's
        // going 70 -> 50.
        let got = labels(&[Some(50.0), Some(30.0), Some(50.0)]);
        assert_eq!(got[2], Classification::Mistake);

        // The same stored values rising after a White move are a gain.
        let got = labels(&[Some(30.0), Some(50.0)]);
        assert_eq!(got[1], Classification::None);
    }

    #[test]
    fn test_missing_records_yield_none() {
        let got = labels(&[Some(50.0), None, Some(50.0)]);
        assert_eq!(got, [Classification::None; 3]);
    }

    #[test]
    fn test_thresholds() {
        let cases = [
            (50.0, 50.4, Classification::Best),
            (50.0, 49.6, Classification::Best),
            (50.0, 48.0, Classification::Excellent),
            (50.0, 47.0, Classification::Good),
            (50.0, 45.0, Classification::Good),
            (50.0, 44.0, Classification::Inaccuracy),
            (50.0, 40.0, Classification::Inaccuracy),
            (50.0, 39.0, Classification::Mistake),
            (100.0, 0.0, Classification::Blunder),
            (40.0, 60.0, Classification::None),
        ];
        for (before, after, expected) in cases {
            assert_eq!(classify_drop(before, after), expected, "{before} -> {after}");
        }
    }

    #[test]
    fn test_reserved_labels_never_assigned() {
        let chances: Vec<Option<f64>> = (0..40).map(|i| Some((i * 37 % 101) as f64)).collect();
        assert!(labels(&chances)
            .iter()
            .all(|c| !matches!(c, Classification::Brilliant | Classification::Forced)));
    }

    #[test]
    fn test_summarize_credits_the_mover() {
        let moves = classify(vec![
            analyzed(0, Some(50.0)),
            analyzed(1, Some(30.0)), // White dropped 20: Mistake
            analyzed(2, Some(30.0)), // Black held: Best
            analyzed(3, Some(30.0)), // White held: Best
        ]);
        let summary = summarize(&moves);
        assert_eq!(summary.white.count(Classification::Mistake), 1);
        assert_eq!(summary.white.count(Classification::Best), 1);
        assert_eq!(summary.black.count(Classification::Best), 1);
        assert_eq!(summary.white.total(), 2);
        assert_eq!(summary.side(PieceColor::Black).total(), 1);
    }
}
