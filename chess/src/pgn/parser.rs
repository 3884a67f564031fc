use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parsed PGN game. Moves are kept as SAN text; resolving them against a
/// board is [`crate::Game::from_pgn`]'s job.
#[derive(Debug, Clone, Default)]
pub struct PgnGame {
    pub tags: BTreeMap<String, String>,
    pub moves: Vec<PgnMove>,
    pub result: GameResult,
}

/// A single move in PGN with metadata
#[derive(Debug, Clone)]
pub struct PgnMove {
    pub san: String,
    pub comment: Option<String>,
    pub nags: Vec<u8>, // Numeric Annotation Glyphs (!!, ?, etc.)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    #[default]
    Ongoing,
}

impl GameResult {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "1-0" => Some(Self::WhiteWins),
            "0-1" => Some(Self::BlackWins),
            "1/2-1/2" => Some(Self::Draw),
            "*" => Some(Self::Ongoing),
            _ => None,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        }
    }
}

/// Parse the first game of a PGN string.
///
/// Handles tag pairs, brace and semicolon comments, nested variations (skipped),
/// NAGs, move numbers and the result token. Parsing stops at the first result
/// token, so trailing games are ignored.
pub fn parse_pgn(input: &str) -> Result<PgnGame, PgnError> {
    let mut game = PgnGame::default();
    let mut movetext = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('%') {
            continue;
        }
        if trimmed.starts_with('[') && movetext.trim().is_empty() {
            let (name, value) = parse_tag(trimmed)?;
            game.tags.insert(name, value);
            continue;
        }
        movetext.push_str(line);
        movetext.push('\n');
    }

    let mut chars = movetext.chars().peekable();
    let mut token = String::new();
    let mut finished = false;

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                flush_token(&mut token, &mut game, &mut finished)?;
                let mut comment = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    comment.push(c);
                }
                if !closed {
                    return Err(PgnError::UnterminatedComment);
                }
                attach_comment(&mut game, comment.trim());
            }
            ';' => {
                flush_token(&mut token, &mut game, &mut finished)?;
                let mut comment = String::new();
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                    comment.push(c);
                }
                attach_comment(&mut game, comment.trim());
            }
            '(' => {
                flush_token(&mut token, &mut game, &mut finished)?;
                let mut depth = 1usize;
                for c in chars.by_ref() {
                    match c {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                if depth != 0 {
                    return Err(PgnError::UnterminatedVariation);
                }
            }
            ')' => return Err(PgnError::InvalidFormat("unbalanced ')'".to_string())),
            c if c.is_whitespace() => flush_token(&mut token, &mut game, &mut finished)?,
            c => token.push(c),
        }
        if finished {
            break;
        }
    }
    if !finished {
        flush_token(&mut token, &mut game, &mut finished)?;
    }

    if game.result == GameResult::Ongoing {
        if let Some(result) = game.tags.get("Result").and_then(|r| GameResult::from_token(r)) {
            game.result = result;
        }
    }

    if game.moves.is_empty() && game.tags.is_empty() {
        return Err(PgnError::Empty);
    }

    Ok(game)
}

fn parse_tag(line: &str) -> Result<(String, String), PgnError> {
    let inner = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or_else(|| PgnError::InvalidTag(line.to_string()))?;
    let (name, rest) = inner
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| PgnError::InvalidTag(line.to_string()))?;
    let rest = rest.trim();
    let value = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .ok_or_else(|| PgnError::InvalidTag(line.to_string()))?;
    Ok((
        name.to_string(),
        value.replace("\\\"", "\"").replace("\\\\", "\\"),
    ))
}

fn flush_token(token: &mut String, game: &mut PgnGame, finished: &mut bool) -> Result<(), PgnError> {
    if token.is_empty() {
        return Ok(());
    }
    let text = std::mem::take(token);

    if let Some(result) = GameResult::from_token(&text) {
        game.result = result;
        *finished = true;
        return Ok(());
    }

    if let Some(nag) = text.strip_prefix('$') {
        let nag = nag
            .parse::<u8>()
            .map_err(|_| PgnError::InvalidFormat(text.clone()))?;
        if let Some(last) = game.moves.last_mut() {
            last.nags.push(nag);
        }
        return Ok(());
    }

    // Castling written with zeros would otherwise look like a move number
    if text.starts_with("0-0") {
        let (san, glyph) = split_glyph(&text);
        game.moves.push(PgnMove {
            san: san.to_string(),
            comment: None,
            nags: glyph.into_iter().collect(),
        });
        return Ok(());
    }

    // Move numbers: "12." "12..." or glued forms like "12.e4"
    let san = text.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
    if san.is_empty() {
        return Ok(());
    }
    if san.len() != text.len() && !text[..text.len() - san.len()].contains('.') {
        return Err(PgnError::InvalidFormat(text));
    }

    let (san, glyph) = split_glyph(san);
    game.moves.push(PgnMove {
        san: san.to_string(),
        comment: None,
        nags: glyph.into_iter().collect(),
    });
    Ok(())
}

/// Split a trailing suffix annotation ("!", "?!", ...) into its NAG.
fn split_glyph(san: &str) -> (&str, Option<u8>) {
    let body = san.trim_end_matches(['!', '?']);
    let nag = match &san[body.len()..] {
        "!" => Some(1),
        "?" => Some(2),
        "!!" => Some(3),
        "??" => Some(4),
        "!?" => Some(5),
        "?!" => Some(6),
        _ => None,
    };
    (body, nag)
}

fn attach_comment(game: &mut PgnGame, comment: &str) {
    if comment.is_empty() {
        return;
    }
    if let Some(last) = game.moves.last_mut() {
        match &mut last.comment {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(comment);
            }
            None => last.comment = Some(comment.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("Invalid PGN format: {0}")]
    InvalidFormat(String),
    #[error("Invalid tag: {0}")]
    InvalidTag(String),
    #[error("Unterminated comment")]
    UnterminatedComment,
    #[error("Unterminated variation")]
    UnterminatedVariation,
    #[error("PGN contains no game")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[Event "Casual"]
[White "Alice"]
[Black "Bob"]
[WhiteElo "1500"]
[Result "1-0"]

1. e4 e5 2. Nf3 {developing} Nc6 (2... d6 3. d4 (3. Bc4)) 3. Bb5 $1 a6?! 1-0
"#;

    #[test]
    fn test_parse_tags_and_moves() {
        let game = parse_pgn(SAMPLE).unwrap();
        assert_eq!(game.tags.get("White").map(String::as_str), Some("Alice"));
        assert_eq!(game.tags.get("WhiteElo").map(String::as_str), Some("1500"));
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
        assert_eq!(game.result, GameResult::WhiteWins);
    }

    #[test]
    fn test_comments_and_nags_attach_to_previous_move() {
        let game = parse_pgn(SAMPLE).unwrap();
        assert_eq!(game.moves[2].comment.as_deref(), Some("developing"));
        assert_eq!(game.moves[4].nags, vec![1]);
        assert_eq!(game.moves[5].nags, vec![6]);
    }

    #[test]
    fn test_glued_move_numbers() {
        let game = parse_pgn("1.e4 e5 2.Nf3 Nf6 3.0-0 *").unwrap();
        assert_eq!(game.moves.len(), 5);
        assert_eq!(game.moves[4].san, "0-0");
        assert_eq!(game.moves[2].san, "Nf3");
        assert_eq!(game.result, GameResult::Ongoing);
    }

    #[test]
    fn test_stops_at_first_result() {
        let game = parse_pgn("1. d4 d5 1/2-1/2\n\n[Event \"Next\"]\n1. e4 *").unwrap();
        assert_eq!(game.moves.len(), 2);
        assert_eq!(game.result, GameResult::Draw);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_pgn(""), Err(PgnError::Empty)));
        assert!(matches!(
            parse_pgn("1. e4 {unterminated"),
            Err(PgnError::UnterminatedComment)
        ));
        assert!(matches!(
            parse_pgn("1. e4 (1. d4"),
            Err(PgnError::UnterminatedVariation)
        ));
        assert!(matches!(
            parse_pgn("[White Alice]\n1. e4"),
            Err(PgnError::InvalidTag(_))
        ));
    }
}
