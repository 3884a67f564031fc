use chess::parse_uci_move;

use super::record::{BestMove, CandidateMove, EvaluationRecord};
use super::UciError;
use crate::{EngineInfo, Score};

/// Token that introduces free-form engine text. Everything after it is prose.
const DIAGNOSTIC_MARKER: &str = "string";

/// Incoming message from UCI engine
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    Option { name: String },
    BestMove(BestMove),
    Info(EngineInfo),
}

/// A decoded line of engine output during a search.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineLine {
    Info(EvaluationRecord),
    BestMove(BestMove),
    Ignored,
}

/// Decode one line of search output.
///
/// `white_to_move` is the side to move in the searched position; it orients
/// the win chance. Never fails: anything that is not a scored `info` line or
/// a `bestmove` line is [`EngineLine::Ignored`], as is any line carrying the
/// diagnostic `string` token.
pub fn decode(line: &str, white_to_move: bool) -> EngineLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.contains(&DIAGNOSTIC_MARKER) {
        return EngineLine::Ignored;
    }

    match tokens.first() {
        Some(&"info") => {
            let info = parse_info_line(&tokens[1..]);
            match EvaluationRecord::from_info(&info, white_to_move) {
                Some(record) => EngineLine::Info(record),
                None => EngineLine::Ignored,
            }
        }
        Some(&"bestmove") => EngineLine::BestMove(parse_bestmove(&tokens[1..])),
        _ => EngineLine::Ignored,
    }
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"option") => {
            // option name <words...> type <kind> ...
            if tokens.get(1) != Some(&"name") {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            let name_tokens: Vec<&str> = tokens[2..]
                .iter()
                .take_while(|t| **t != "type")
                .copied()
                .collect();
            if name_tokens.is_empty() {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            Ok(UciMessage::Option {
                name: name_tokens.join(" "),
            })
        }

        Some(&"bestmove") => {
            if tokens.len() < 2 {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            if tokens[1] != "(none)" && parse_uci_move(tokens[1]).is_none() {
                return Err(UciError::InvalidMove(tokens[1].to_string()));
            }
            Ok(UciMessage::BestMove(parse_bestmove(&tokens[1..])))
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        _ => Err(UciError::UnknownMessage(line.to_string())),
    }
}

fn parse_bestmove(tokens: &[&str]) -> BestMove {
    let best = tokens.first().and_then(|t| CandidateMove::from_uci(t));
    let ponder = match tokens.get(1) {
        Some(&"ponder") => tokens.get(2).and_then(|t| CandidateMove::from_uci(t)),
        _ => None,
    };
    BestMove { best, ponder }
}

/// Parse the tokens of an "info" line (after the leading `info`).
fn parse_info_line(tokens: &[&str]) -> EngineInfo {
    let mut info = EngineInfo::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "seldepth" => {
                i += 1;
                info.seldepth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                info.time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nps" => {
                i += 1;
                info.nps = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value_str) = tokens.get(i) {
                        info.score = match score_type {
                            "cp" => value_str.parse().ok().map(Score::Centipawns),
                            "mate" => value_str.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
                // Bound markers qualify the score; skip them.
                while matches!(tokens.get(i + 1), Some(&"lowerbound") | Some(&"upperbound")) {
                    i += 1;
                }
            }
            "pv" => {
                // Collect all moves until next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    if let Some(mv) = parse_uci_move(tokens[i]) {
                        info.pv.push(mv);
                    }
                    i += 1;
                }
                continue; // Don't increment i again
            }
            "multipv" => {
                i += 1;
                info.multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "currmove" => {
                i += 1;
                info.currmove = tokens.get(i).and_then(|s| parse_uci_move(s));
            }
            "hashfull" => {
                i += 1;
                info.hashfull = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "string" => {
                info.string = Some(tokens[i + 1..].join(" "));
                break;
            }
            _ => {
                // Unknown keyword, skip
            }
        }
        i += 1;
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "sbhits"
            | "cpuload"
            | "refutation"
            | "currline"
            | "string"
    )
}
