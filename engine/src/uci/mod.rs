pub mod parser;
pub mod record;

pub use parser::{decode, parse_uci_message, EngineLine, UciMessage};
pub use record::{BestMove, CandidateMove, EvaluationRecord};

#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Unknown UCI message: {0}")]
    UnknownMessage(String),
    #[error("Invalid move: {0}")]
    InvalidMove(String),
}
