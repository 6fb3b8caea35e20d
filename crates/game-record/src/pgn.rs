//! PGN parsing utilities — lightweight regex-based parser.

use regex::Regex;
use thiserror::Error;

use crate::game_data::{GameMetadata, GameRecord};

#[derive(Error, Debug)]
pub enum PgnError {
    #[error("no moves found in PGN movetext")]
    NoMoves,
}

/// Parse a PGN string into a GameRecord: headers plus the main-line SAN moves.
/// Comments, variations and NAGs are stripped before move extraction.
pub fn parse_pgn(pgn: &str) -> Result<GameRecord, PgnError> {
    let header_re = Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("valid regex");

    let mut metadata = GameMetadata::default();

    for cap in header_re.captures_iter(pgn) {
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Event" => metadata.event = value,
            "Date" => metadata.date = value,
            "Result" => metadata.result = value,
            _ => {}
        }
    }

    let moves = extract_moves(pgn);
    if moves.is_empty() {
        return Err(PgnError::NoMoves);
    }

    Ok(GameRecord { metadata, moves })
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    // Remove headers
    let header_re = Regex::new(r"\[[^\]]*\]").unwrap();
    let no_headers = header_re.replace_all(pgn, "");

    // Remove comments
    let comment_re = Regex::new(r"\{[^}]*\}").unwrap();
    let no_comments = comment_re.replace_all(&no_headers, "");

    // Remove variations
    let variation_re = Regex::new(r"\([^)]*\)").unwrap();
    let no_variations = variation_re.replace_all(&no_comments, "");

    // Extract moves
    let move_re =
        Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O").unwrap();

    move_re
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pgn_basic() {
        let pgn = r#"[White "Player1"]
[Black "Player2"]
[Event "Casual Game"]
[Date "2025.01.15"]
[Result "1-0"]

1. e4 e5 2. Nf3 Nc6 1-0"#;

        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.metadata.white, "Player1");
        assert_eq!(game.metadata.black, "Player2");
        assert_eq!(game.metadata.event, "Casual Game");
        assert_eq!(game.metadata.result, "1-0");
        assert_eq!(game.moves.len(), 4);
        assert_eq!(game.moves[0], "e4");
        assert_eq!(game.moves[3], "Nc6");
    }

    #[test]
    fn test_missing_headers_use_defaults() {
        let game = parse_pgn("1. d4 d5").unwrap();
        assert_eq!(game.metadata.white, "Unknown");
        assert_eq!(game.metadata.date, "Unknown");
        assert_eq!(game.metadata.result, "*");
        assert_eq!(game.moves, vec!["d4", "d5"]);
    }

    #[test]
    fn test_comments_and_variations_stripped() {
        let pgn = "1. e4 {king pawn} e5 (1... c5 2. Nf3) 2. Nf3 Nc6";
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.moves, vec!["e4", "e5", "Nf3", "Nc6"]);
    }

    #[test]
    fn test_castling_and_promotion_tokens() {
        let pgn = "1. e4 e5 2. Nf3 Nf6 3. Bc4 Bc5 4. O-O d5 5. exd5 e4 6. d6 e3 7. d7+ Kf8 8. d8=Q+";
        let game = parse_pgn(pgn).unwrap();
        assert!(game.moves.contains(&"O-O".to_string()));
        assert!(game.moves.contains(&"d8=Q+".to_string()));
        assert!(game.moves.contains(&"exd5".to_string()));
    }

    #[test]
    fn test_empty_movetext_is_error() {
        let pgn = r#"[White "A"]
[Black "B"]
"#;
        assert!(parse_pgn(pgn).is_err());
    }
}
