//! Board decorations for the analysis cursor: candidate arrows and the
//! graded last move.

use serde::Serialize;

use crate::model::{Analysis, Classification};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrow {
    pub from: String,
    pub to: String,
    /// Candidate rank, 1 = engine's first choice.
    pub rank: u32,
    pub win_chance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquareHighlight {
    pub square: String,
    pub color: String,
    pub classification: Classification,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardOverlay {
    pub index: usize,
    /// Position shown: the one before move `index`.
    pub fen: String,
    pub arrows: Vec<Arrow>,
    pub highlights: Vec<SquareHighlight>,
    /// Grade of the move that led here.
    pub classification: Option<Classification>,
}

/// Overlay for entry `index`, or `None` past the end.
///
/// Arrows come from every candidate at the deepest reported depth. The
/// previous move's squares are highlighted in the colour of the grade stored
/// on this entry.
pub fn board_overlay(analysis: &Analysis, index: usize) -> Option<BoardOverlay> {
    let current = analysis.moves.get(index)?;

    let arrows = match current.best() {
        Some(best) => {
            let mut arrows: Vec<Arrow> = current
                .records
                .iter()
                .filter(|r| r.depth == best.depth)
                .filter_map(|r| {
                    r.best_move.as_ref().map(|m| Arrow {
                        from: m.from.clone(),
                        to: m.to.clone(),
                        rank: r.rank(),
                        win_chance: r.win_chance,
                    })
                })
                .collect();
            arrows.sort_by_key(|a| a.rank);
            arrows
        }
        None => vec![],
    };

    let classification = current.classification;
    let highlights = match (index.checked_sub(1), classification) {
        (Some(prev), Some(label)) => match label.highlight_color() {
            Some(color) => {
                let played = &analysis.moves[prev].played;
                [&played.from, &played.to]
                    .into_iter()
                    .map(|square| SquareHighlight {
                        square: square.clone(),
                        color: color.to_string(),
                        classification: label,
                    })
                    .collect()
            }
            None => vec![],
        },
        _ => vec![],
    };

    Some(BoardOverlay {
        index,
        fen: current.fen.clone(),
        arrows,
        highlights,
        classification,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::model::{AnalyzedMove, GameHeaders, PlyInput, SearchSettings};
    use chess::Game;
    use engine::{CandidateMove, EvaluationRecord, Score};

    fn record(depth: u32, multipv: u32, uci: &str, win_chance: f64) -> EvaluationRecord {
        EvaluationRecord {
            depth,
            seldepth: None,
            multipv: Some(multipv),
            score: Score::Centipawns(0),
            win_chance,
            best_move: CandidateMove::from_uci(uci),
            pv: vec![uci.to_string()],
        }
    }

    fn sample() -> Analysis {
        let game = Game::from_pgn("1. e4 e5 2. Nf3 *").unwrap();
        let records = vec![
            vec![record(20, 1, "e2e4", 55.0)],
            vec![
                record(20, 1, "c7c5", 52.0),
                record(20, 2, "e7e5", 51.0),
                record(19, 3, "e7e6", 50.0),
            ],
            vec![record(20, 1, "g1f3", 30.0)],
        ];
        let moves: Vec<AnalyzedMove> = PlyInput::from_game(&game)
            .into_iter()
            .zip(records)
            .map(|(input, records)| AnalyzedMove::new(input, records))
            .collect();
        Analysis::new(
            "1. e4 e5 2. Nf3 *".to_string(),
            GameHeaders::default(),
            SearchSettings::default(),
            classify(moves),
        )
    }

    #[test]
    fn test_arrows_at_best_depth() {
        let overlay = board_overlay(&sample(), 1).unwrap();
        let arrows: Vec<(&str, &str, u32)> = overlay
            .arrows
            .iter()
            .map(|a| (a.from.as_str(), a.to.as_str(), a.rank))
            .collect();
        assert_eq!(arrows, [("c7", "c5", 1), ("e7", "e5", 2)]);
    }

    #[test]
    fn test_first_entry_has_no_highlight() {
        let overlay = board_overlay(&sample(), 0).unwrap();
        assert!(overlay.highlights.is_empty());
        assert_eq!(overlay.classification, Some(Classification::None));
        assert_eq!(
            overlay.fen,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn test_highlights_previous_move() {
        // Index 1 grades White's e4: 55 -> 52 is Good.
        // Index 2 grades Black's e5: 48 -> 70 is a gain, no colour.
        let analysis = sample();
        let overlay = board_overlay(&analysis, 1).unwrap();
        assert_eq!(overlay.classification, Some(Classification::Good));
        let squares: Vec<&str> = overlay.highlights.iter().map(|h| h.square.as_str()).collect();
        assert_eq!(squares, ["e2", "e4"]);
        assert!(overlay.highlights.iter().all(|h| h.color == "#97af8b"));

        let overlay = board_overlay(&analysis, 2).unwrap();
        assert_eq!(overlay.classification, Some(Classification::None));
        assert!(overlay.highlights.is_empty());
    }

    #[test]
    fn test_out_of_range() {
        assert!(board_overlay(&sample(), 3).is_none());
    }
}
