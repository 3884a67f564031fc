//! Plain-text rendering of analyses for the terminal.

use std::fmt::Write;

use analysis::{summarize, Analysis, AnalysisSummary, AnalyzedMove, Classification};
use chess::PieceColor;
use engine::Score;

/// Engine score turned to White's point of view.
fn white_score(analyzed: &AnalyzedMove) -> Option<Score> {
    let record = analyzed.best()?;
    match chess::side_to_move(&analyzed.fen) {
        Some(PieceColor::Black) => Some(record.score.negate()),
        _ => Some(record.score),
    }
}

fn move_label(analyzed: &AnalyzedMove) -> String {
    let number = (analyzed.played.ply + 1) / 2;
    match analyzed.played.color {
        PieceColor::White => format!("{}. {}", number, analyzed.played.san),
        PieceColor::Black => format!("{}... {}", number, analyzed.played.san),
    }
}

/// One row per move: the evaluation of the position it was played from, the
/// engine's choice there, and the grade the move earned.
pub fn format_moves(analysis: &Analysis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:>7} {:>7}  {:<7} {}",
        "Move", "Eval", "White%", "Best", "Grade"
    );
    for (index, analyzed) in analysis.moves.iter().enumerate() {
        let eval = white_score(analyzed)
            .map(|s| s.display())
            .unwrap_or_else(|| "-".to_string());
        let win = analyzed
            .win_chance()
            .map(|w| format!("{:.1}", w))
            .unwrap_or_else(|| "-".to_string());
        let best = analyzed
            .best()
            .and_then(|r| r.best_move.as_ref())
            .map(|m| m.uci.as_str())
            .unwrap_or("-");
        let grade = match analysis.grade_of(index) {
            Some(Classification::None) | None => String::new(),
            Some(label) => label.to_string(),
        };
        let _ = writeln!(
            out,
            "{:<14} {:>7} {:>7}  {:<7} {}",
            move_label(analyzed),
            eval,
            win,
            best,
            grade
        );
    }
    out
}

const SUMMARY_LABELS: [Classification; 6] = [
    Classification::Best,
    Classification::Excellent,
    Classification::Good,
    Classification::Inaccuracy,
    Classification::Mistake,
    Classification::Blunder,
];

pub fn format_summary(analysis: &Analysis) -> String {
    let summary = summarize(&analysis.moves);
    let mut out = String::new();
    let _ = writeln!(out, "{}", analysis.headers.title());
    let _ = writeln!(out, "{:<12} {:>6} {:>6}", "", "White", "Black");
    for label in SUMMARY_LABELS {
        let _ = writeln!(
            out,
            "{:<12} {:>6} {:>6}",
            label.label(),
            summary.white.count(label),
            summary.black.count(label)
        );
    }
    let missing = analysis.missing_evaluations();
    if missing > 0 {
        let _ = writeln!(out, "{} position(s) without engine data", missing);
    }
    out
}

pub fn format_history(summaries: &[AnalysisSummary]) -> String {
    if summaries.is_empty() {
        return "No saved analyses\n".to_string();
    }
    let mut out = String::new();
    for s in summaries {
        let _ = writeln!(
            out,
            "{}  {:>4} plies  {:<7} {}",
            s.id,
            s.plies,
            s.result.as_deref().unwrap_or("*"),
            s.title
        );
    }
    out
}
