//! The analysis currently being looked at, with a move cursor.

use crate::model::{Analysis, AnalyzedMove};
use crate::overlay::{board_overlay, BoardOverlay};

/// Holds at most one analysis. Created empty, filled by
/// [`crate::analyze_game`], cleared when the caller is done with it.
#[derive(Debug, Default)]
pub struct AnalysisContext {
    current: Option<Analysis>,
    cursor: usize,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `analysis`, returning the one it replaces. Cursor resets.
    pub fn replace(&mut self, analysis: Analysis) -> Option<Analysis> {
        tracing::debug!(id = %analysis.id, "Analysis context replaced");
        self.cursor = 0;
        self.current.replace(analysis)
    }

    pub fn current(&self) -> Option<&Analysis> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) -> Option<Analysis> {
        self.cursor = 0;
        self.current.take()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor. Returns false if there is nothing at `index`.
    pub fn select(&mut self, index: usize) -> bool {
        match &self.current {
            Some(analysis) if index < analysis.moves.len() => {
                self.cursor = index;
                true
            }
            _ => false,
        }
    }

    pub fn next(&mut self) -> bool {
        self.select(self.cursor + 1)
    }

    pub fn prev(&mut self) -> bool {
        match self.cursor.checked_sub(1) {
            Some(index) => self.select(index),
            None => false,
        }
    }

    pub fn selected(&self) -> Option<&AnalyzedMove> {
        self.current.as_ref()?.moves.get(self.cursor)
    }

    /// Board decorations at the cursor.
    pub fn overlay(&self) -> Option<BoardOverlay> {
        board_overlay(self.current.as_ref()?, self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameHeaders, PlyInput, SearchSettings};
    use chess::Game;

    fn analysis() -> Analysis {
        let game = Game::from_pgn("1. d4 d5 2. c4 *").unwrap();
        let moves = PlyInput::from_game(&game)
            .into_iter()
            .map(|input| AnalyzedMove::new(input, vec![]))
            .collect();
        Analysis::new(
            String::new(),
            GameHeaders::default(),
            SearchSettings::default(),
            moves,
        )
    }

    #[test]
    fn test_lifecycle() {
        let mut ctx = AnalysisContext::new();
        assert!(ctx.is_empty());
        assert!(ctx.overlay().is_none());
        assert!(!ctx.select(0));

        let first = analysis();
        let first_id = first.id.clone();
        assert!(ctx.replace(first).is_none());
        assert_eq!(ctx.current().map(|a| a.id.as_str()), Some(first_id.as_str()));

        assert!(ctx.select(2));
        assert_eq!(ctx.selected().map(|m| m.played.san.as_str()), Some("c4"));

        let replaced = ctx.replace(analysis()).unwrap();
        assert_eq!(replaced.id, first_id);
        assert_eq!(ctx.cursor(), 0);

        assert!(ctx.clear().is_some());
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_cursor_bounds() {
        let mut ctx = AnalysisContext::new();
        ctx.replace(analysis());

        assert!(!ctx.prev());
        assert!(ctx.next());
        assert!(ctx.next());
        assert!(!ctx.next());
        assert_eq!(ctx.cursor(), 2);
        assert!(!ctx.select(3));
        assert!(ctx.prev());
        assert_eq!(ctx.overlay().map(|o| o.index), Some(1));
    }
}
