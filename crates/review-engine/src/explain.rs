//! Explanation composition: priority rules over extracted factors, and the
//! sentence templates for each outcome tier.

use chess::{Board, ChessMove};

use crate::board::{captured_piece_name, gives_check, is_capture, parse_uci_move, san};
use crate::config::ReviewConfig;
use crate::evaluate::{CandidateMove, Evaluator};
use crate::features::{self, Factor, Strength};
use crate::rank::Standing;
use crate::uci::{EngineLine, UciEngine};

/// Join phrases: one verbatim, two with "and", three or more with an
/// Oxford comma.
pub fn join_phrases(phrases: &[String]) -> String {
    match phrases.len() {
        0 => String::new(),
        1 => phrases[0].clone(),
        2 => format!("{} and {}", phrases[0], phrases[1]),
        _ => format!(
            "{}, and {}",
            phrases[..phrases.len() - 1].join(", "),
            phrases[phrases.len() - 1]
        ),
    }
}

pub fn join_factors(factors: &[Factor]) -> String {
    let phrases: Vec<String> = factors.iter().map(Factor::phrase).collect();
    join_phrases(&phrases)
}

pub fn join_strengths(strengths: &[Strength]) -> String {
    let phrases: Vec<String> = strengths.iter().map(|s| s.phrase().to_string()).collect();
    join_phrases(&phrases)
}

/// Missed-tactic sentence; the tactical factors join with a plain "and".
pub fn missed_sentence(played_san: &str, best_san: &str, factors: &[Factor]) -> String {
    let joined = factors
        .iter()
        .map(Factor::phrase)
        .collect::<Vec<_>>()
        .join(" and ");
    format!("{played_san} missed {joined}. {best_san} would be better.")
}

pub fn positional_sentence(best_san: &str, played_san: &str, factors: &[Factor]) -> String {
    format!(
        "{best_san} is better than {played_san} because it {}.",
        join_factors(factors)
    )
}

/// Generic fallback when feature extraction degraded.
pub fn generic_sentence(best_san: &str, played_san: &str) -> String {
    format!("{best_san} would give better position control than {played_san}.")
}

/// Minimal sentence for the best-move-only rescue path.
pub fn degraded_sentence(best_san: &str, played_san: &str) -> String {
    format!("{best_san} would be a better move than {played_san}.")
}

const BEST_MOVE_DEGRADED: &str = "Excellent! This is the strongest move in the position.";

/// Tactical special cases of the best-move template: check and capture
/// take precedence over everything else.
pub fn best_move_tactical_comment(board: &Board, mv: ChessMove) -> Option<String> {
    let san_move = san(board, mv);

    if gives_check(board, mv) {
        return Some(format!(
            "Excellent! {san_move} is the best move, giving a powerful check that limits opponent's options."
        ));
    }

    if is_capture(board, mv) {
        return Some(match captured_piece_name(board, mv) {
            Some(piece) => format!(
                "Perfect! {san_move} is the strongest move, capturing the {piece} with clear advantage."
            ),
            None => format!(
                "Perfect! {san_move} is the strongest move, with a tactically sound capture."
            ),
        });
    }

    None
}

/// Follow-up special cases: the engine line behind the move starts with a
/// capture or a check.
pub fn best_move_followup_comment(
    board: &Board,
    mv: ChessMove,
    after: &Board,
    line: &EngineLine,
) -> Option<String> {
    if line.pv.len() < 2 {
        return None;
    }
    let san_move = san(board, mv);
    let next = parse_uci_move(after, &line.pv[0])?;

    if is_capture(after, next) {
        return Some(format!(
            "Excellent! {san_move} is the best move, setting up a strong capture on the next move."
        ));
    }
    if gives_check(after, next) {
        return Some(format!(
            "Perfect! {san_move} is the best move, preparing a strong check on the next move."
        ));
    }
    None
}

/// Positional tail of the best-move template.
pub fn best_move_positional_comment(board: &Board, mv: ChessMove) -> String {
    let san_move = san(board, mv);
    let strengths = features::move_strengths(board, mv);
    if !strengths.is_empty() {
        format!(
            "Perfect choice! {san_move} is the best move, {}.",
            join_strengths(&strengths)
        )
    } else {
        format!("Excellent! {san_move} is the best move, giving you the strongest position.")
    }
}

/// Full best-move commentary: tactical special cases, then the follow-up
/// probe, then positional strengths, then the generic close. Probe failures
/// degrade silently.
pub async fn best_move_comment<E: UciEngine>(
    evaluator: &mut Evaluator<E>,
    config: &ReviewConfig,
    board: &Board,
    mv: ChessMove,
) -> String {
    if board.piece_on(mv.get_source()).is_none() {
        return BEST_MOVE_DEGRADED.to_string();
    }

    if let Some(comment) = best_move_tactical_comment(board, mv) {
        return comment;
    }

    let after = board.make_move_new(mv);
    if let Ok(line) = evaluator.probe_line(&after, config.followup).await {
        if let Some(comment) = best_move_followup_comment(board, mv, &after, &line) {
            return comment;
        }
    }

    best_move_positional_comment(board, mv)
}

/// Commentary for a played move that ranked among the candidates without
/// being the engine's first choice.
pub fn alternative_comment(
    board: &Board,
    played: ChessMove,
    best: &CandidateMove,
    standing: Standing,
) -> String {
    let san_played = san(board, played);
    let san_best = &best.san;
    let strengths = features::move_strengths(board, played);

    match standing {
        Standing::PracticallyEqual { .. } => {
            if !strengths.is_empty() {
                format!(
                    "Very good! {san_played} is almost as strong as the top engine choice ({san_best}), {}.",
                    join_strengths(&strengths)
                )
            } else {
                format!(
                    "Very good! {san_played} is practically equal to the top engine choice ({san_best})."
                )
            }
        }
        Standing::StrongAlternative { .. } => {
            if !strengths.is_empty() {
                format!(
                    "{san_played} is a strong alternative to {san_best}, {}.",
                    join_strengths(&strengths)
                )
            } else {
                format!(
                    "{san_played} is a strong alternative to the top engine choice ({san_best})."
                )
            }
        }
        _ => {
            if !strengths.is_empty() {
                format!(
                    "{san_played} is among the top choices, {}.",
                    join_strengths(&strengths)
                )
            } else if features::is_similar_move_type(board, played, best.mv) {
                format!(
                    "{san_played} follows a similar plan to the top engine choice ({san_best})."
                )
            } else {
                format!("{san_played} is among the top choices in this position.")
            }
        }
    }
}

/// Commentary for a move outside the candidate list: tactical pass, then
/// the positional comparison ladder, then the last-resort lookahead.
/// Returns None only when every tier comes up empty and the two moves
/// render identically.
pub async fn unranked_comment<E: UciEngine>(
    evaluator: &mut Evaluator<E>,
    config: &ReviewConfig,
    board: &Board,
    played: ChessMove,
    best: &CandidateMove,
    delta_cp: i32,
    move_number: u32,
) -> Option<String> {
    let san_played = san(board, played);
    let san_best = &best.san;

    let tactical = features::tactical_factors(board, played, best.mv, delta_cp, config.material_cp);
    if !tactical.is_empty() {
        return Some(missed_sentence(&san_played, san_best, &tactical));
    }

    match features::positional_factors(board, played, best.mv, move_number) {
        // Internal inconsistency: degrade to the generic sentence
        None => Some(generic_sentence(san_best, &san_played)),
        Some(mut factors) => {
            if factors.is_empty() {
                let after_best = board.make_move_new(best.mv);
                if let Ok(line) = evaluator.probe_line(&after_best, config.probe).await {
                    if let Some(factor) =
                        features::lookahead_factor(&after_best, board.side_to_move(), &line)
                    {
                        factors.push(factor);
                    }
                }
            }
            if factors.is_empty() && san_played != *san_best {
                factors.push(Factor::LongTermProspects);
            }
            if factors.is_empty() {
                None
            } else {
                Some(positional_sentence(san_best, &san_played, &factors))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::find_san_move;
    use crate::features::Lookahead;

    fn board_after(moves: &[&str]) -> Board {
        let mut board = Board::default();
        for san_str in moves {
            let m = find_san_move(&board, san_str).unwrap();
            board = board.make_move_new(m);
        }
        board
    }

    #[test]
    fn test_join_phrases() {
        let one = vec!["a".to_string()];
        assert_eq!(join_phrases(&one), "a");

        let two = vec!["a".to_string(), "b".to_string()];
        assert_eq!(join_phrases(&two), "a and b");

        let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(join_phrases(&three), "a, b, and c");
    }

    #[test]
    fn test_missed_sentence_scenario() {
        let sentence = missed_sentence(
            "a3",
            "exd5",
            &[Factor::MissedCapture, Factor::MaterialGain],
        );
        assert_eq!(
            sentence,
            "a3 missed a capture opportunity and material gain. exd5 would be better."
        );
    }

    #[test]
    fn test_positional_sentence() {
        let sentence = positional_sentence("Nf3", "a3", &[Factor::BetterDevelopment]);
        assert_eq!(
            sentence,
            "Nf3 is better than a3 because it improves piece development."
        );

        let sentence = positional_sentence(
            "Nf3",
            "a3",
            &[Factor::FutureTactic(Lookahead::Opportunity)],
        );
        assert_eq!(
            sentence,
            "Nf3 is better than a3 because it sets up a tactical opportunity in future moves."
        );
    }

    #[test]
    fn test_degraded_sentences() {
        assert_eq!(
            generic_sentence("Nf3", "a3"),
            "Nf3 would give better position control than a3."
        );
        assert_eq!(
            degraded_sentence("Nf3", "a3"),
            "Nf3 would be a better move than a3."
        );
    }

    #[test]
    fn test_best_move_tactical_precedence() {
        // Check wins over everything
        let board = board_after(&["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6"]);
        let mate = find_san_move(&board, "Qxf7#").unwrap();
        let comment = best_move_tactical_comment(&board, mate).unwrap();
        assert!(comment.starts_with("Excellent! Qxf7# is the best move, giving a powerful check"));

        // Plain capture names the captured piece
        let board = board_after(&["e4", "d5"]);
        let capture = find_san_move(&board, "exd5").unwrap();
        let comment = best_move_tactical_comment(&board, capture).unwrap();
        assert_eq!(
            comment,
            "Perfect! exd5 is the strongest move, capturing the pawn with clear advantage."
        );

        // Quiet move: no tactical comment
        let board = Board::default();
        let quiet = find_san_move(&board, "Nf3").unwrap();
        assert!(best_move_tactical_comment(&board, quiet).is_none());
    }

    #[test]
    fn test_best_move_positional_tail() {
        let board = Board::default();
        let e4 = find_san_move(&board, "e4").unwrap();
        let comment = best_move_positional_comment(&board, e4);
        assert_eq!(
            comment,
            "Perfect choice! e4 is the best move, controlling the center with a pawn."
        );

        let a3 = find_san_move(&board, "a3").unwrap();
        let comment = best_move_positional_comment(&board, a3);
        assert_eq!(
            comment,
            "Excellent! a3 is the best move, giving you the strongest position."
        );
    }

    #[test]
    fn test_followup_comment() {
        let board = board_after(&["e4", "e5"]);
        let mv = find_san_move(&board, "Nf3").unwrap();
        let after = board.make_move_new(mv);

        // Quiet reply: nothing fires
        let line = EngineLine {
            pv: vec!["d7d6".to_string(), "d2d4".to_string()],
            cp: Some(20),
            mate: None,
        };
        assert!(best_move_followup_comment(&board, mv, &after, &line).is_none());

        // Illegal head for this position: silently nothing
        let line = EngineLine {
            pv: vec!["f6e4".to_string(), "d2d3".to_string()],
            cp: Some(20),
            mate: None,
        };
        assert!(best_move_followup_comment(&board, mv, &after, &line).is_none());

        // Line opening with a capture
        let board = board_after(&["e4", "d5"]);
        let mv = find_san_move(&board, "Nc3").unwrap();
        let after = board.make_move_new(mv);
        let line = EngineLine {
            pv: vec!["d5e4".to_string(), "c3e4".to_string()],
            cp: Some(10),
            mate: None,
        };
        let comment = best_move_followup_comment(&board, mv, &after, &line).unwrap();
        assert!(comment.contains("setting up a strong capture on the next move"));
    }
}
