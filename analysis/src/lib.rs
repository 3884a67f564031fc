//! Game analysis pipeline: evaluate every position of a replayed game on a
//! pool of engine sessions, then grade each move by how much it moved the
//! mover's win chance.

pub mod classifier;
pub mod context;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod overlay;
pub mod store;

pub use classifier::{classify, classify_drop, summarize, ClassificationSummary, SideSummary};
pub use context::AnalysisContext;
pub use error::{AnalysisError, PersistenceError};
pub use model::{
    Analysis, AnalysisRequest, AnalyzedMove, Classification, GameHeaders, PlyInput, Progress,
    SearchSettings,
};
pub use orchestrator::{analyze_game, evaluate_moves, evaluate_position, Completion, PositionEvaluation};
pub use overlay::{board_overlay, Arrow, BoardOverlay, SquareHighlight};
pub use store::{now_timestamp, AnalysisStore, AnalysisSummary, JsonStore, Storable};
