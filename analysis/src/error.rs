use chess::GameError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The PGN could not be parsed or replayed. No partial analysis exists.
    #[error("Game rejected: {0}")]
    Game(#[from] GameError),
    #[error("No engine sessions available")]
    NoSessions,
}

/// Errors from the local analysis store.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid analysis id: {0}")]
    InvalidId(String),
}
