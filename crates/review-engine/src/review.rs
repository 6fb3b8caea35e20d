//! Game review orchestration: drives evaluation, classification and
//! explanation across all plies of a game's main line.
//!
//! Error containment: fatal failures (unreadable game, unreachable engine)
//! short-circuit into `GameAnalysis.errors`; everything else is recorded on
//! the ply it hit and the loop continues. The caller always receives a
//! well-formed GameAnalysis.

use chess::{Board, ChessMove, Color};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use game_record::game_data::{GameMetadata, GameRecord};
use game_record::pgn::parse_pgn;

use crate::board::{find_san_move, san};
use crate::classify::{classify, QualityTier};
use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::evaluate::Evaluator;
use crate::explain;
use crate::rank::{rank_played, Standing};
use crate::score::Evaluation;
use crate::uci::{Stockfish, UciEngine};

/// One analyzed ply. `quality`/`evaluation` are absent only when the
/// evaluation itself failed (then `error` says why); the explanation
/// fields are populated only for sub-optimal moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    pub ply: u32,
    pub move_number: u32,
    pub mover: String,
    #[serde(rename = "move")]
    pub san: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_move: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_variation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Root output: one record per main-line ply, plus any fatal errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameAnalysis {
    pub metadata: GameMetadata,
    pub moves: Vec<MoveRecord>,
    pub errors: Vec<String>,
}

/// Review a game from PGN text with a freshly spawned engine. The fatal
/// error boundary: parse and spawn failures come back inside the analysis,
/// never as an Err.
pub async fn review_game(config: &ReviewConfig, pgn: &str) -> GameAnalysis {
    let game = match parse_pgn(pgn) {
        Ok(game) => game,
        Err(e) => {
            return GameAnalysis {
                metadata: GameMetadata::default(),
                moves: Vec::new(),
                errors: vec![ReviewError::GameUnreadable(e.to_string()).to_string()],
            }
        }
    };

    let engine = match Stockfish::new(&config.engine_path).await {
        Ok(engine) => engine,
        Err(e) => {
            return GameAnalysis {
                metadata: game.metadata,
                moves: Vec::new(),
                errors: vec![e.to_string()],
            }
        }
    };

    let mut evaluator = Evaluator::new(engine);
    let analysis = analyze_moves(&mut evaluator, config, &game).await;
    evaluator.into_engine().quit().await;
    analysis
}

/// Analyze a parsed game against an already running engine. Generic over
/// the engine so tests drive it with a scripted mock.
pub async fn analyze_moves<E: UciEngine>(
    evaluator: &mut Evaluator<E>,
    config: &ReviewConfig,
    game: &GameRecord,
) -> GameAnalysis {
    info!(
        white = %game.metadata.white,
        black = %game.metadata.black,
        plies = game.moves.len(),
        "Starting game review"
    );

    let mut records: Vec<MoveRecord> = Vec::with_capacity(game.moves.len());
    let mut errors: Vec<String> = Vec::new();
    let mut board = Board::default();

    // The running previous evaluation, owned here and passed forward
    let mut previous = match evaluator.evaluate(&board, config.shallow).await {
        Ok(eval) => eval,
        Err(e) => {
            errors.push(
                ReviewError::EngineUnavailable(format!("initial evaluation failed: {e}"))
                    .to_string(),
            );
            return GameAnalysis {
                metadata: game.metadata.clone(),
                moves: records,
                errors,
            };
        }
    };

    for (i, san_str) in game.moves.iter().enumerate() {
        let ply = (i + 1) as u32;
        let move_number = (i / 2) as u32 + 1;
        let mover = board.side_to_move();

        let mv = match find_san_move(&board, san_str) {
            Ok(mv) => mv,
            Err(e) => {
                warn!(ply, %san_str, error = %e, "Unresolvable move");
                records.push(error_record(ply, move_number, mover, san_str, &e.to_string()));
                continue;
            }
        };

        // Snapshot, then apply
        let before = board;
        board = board.make_move_new(mv);

        let current = match evaluator.evaluate(&board, config.shallow).await {
            Ok(eval) => eval,
            Err(e) => {
                warn!(ply, error = %e, "Evaluation failed for ply");
                records.push(error_record(ply, move_number, mover, san_str, &e.to_string()));
                // previous carries forward to the next ply
                continue;
            }
        };

        let delta = current.for_mover(mover) - previous.for_mover(mover);
        let quality = classify(delta, &config.thresholds);

        let mut record = MoveRecord {
            ply,
            move_number,
            mover: mover_name(mover).to_string(),
            san: san_str.clone(),
            quality: Some(quality),
            evaluation: Some(current),
            explanation: None,
            best_move: None,
            principal_variation: None,
            error: None,
        };

        if quality != QualityTier::Good {
            debug!(ply, quality = quality.as_str(), delta, "Explaining sub-optimal move");
            match explain_ply(evaluator, config, &before, mv, move_number).await {
                Ok(explained) => {
                    record.explanation = explained.explanation;
                    record.best_move = Some(explained.best_move);
                    record.principal_variation = explained.principal_variation;
                }
                Err(e) => record.error = Some(e.to_string()),
            }
        }

        records.push(record);
        previous = current;
    }

    info!(moves = records.len(), "Review complete");

    GameAnalysis {
        metadata: game.metadata.clone(),
        moves: records,
        errors,
    }
}

fn mover_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

fn error_record(
    ply: u32,
    move_number: u32,
    mover: Color,
    san_str: &str,
    error: &str,
) -> MoveRecord {
    MoveRecord {
        ply,
        move_number,
        mover: mover_name(mover).to_string(),
        san: san_str.to_string(),
        quality: None,
        evaluation: None,
        explanation: None,
        best_move: None,
        principal_variation: None,
        error: Some(error.to_string()),
    }
}

struct Explained {
    explanation: Option<String>,
    best_move: String,
    principal_variation: Option<String>,
}

/// The explanation ladder for one sub-optimal ply, on the pre-move
/// position. An explicit chain: full candidate analysis first; any engine
/// failure in it degrades to the best-move-only rescue; a rescue failure
/// propagates and becomes the ply's error.
async fn explain_ply<E: UciEngine>(
    evaluator: &mut Evaluator<E>,
    config: &ReviewConfig,
    before: &Board,
    played: ChessMove,
    move_number: u32,
) -> Result<Explained, ReviewError> {
    match full_explanation(evaluator, config, before, played, move_number).await {
        Ok(explained) => Ok(explained),
        Err(ReviewError::EngineQuery(reason)) => {
            debug!(reason, "Deep analysis failed, degrading to best-move query");
            let best = evaluator.best_move_only(before, config.rescue).await?;
            let best_san = san(before, best);
            let explanation = explain::degraded_sentence(&best_san, &san(before, played));
            Ok(Explained {
                explanation: Some(explanation),
                best_move: best_san,
                principal_variation: None,
            })
        }
        Err(other) => Err(other),
    }
}

/// The strong path: deep MultiPV candidates, standing, features, sentence.
async fn full_explanation<E: UciEngine>(
    evaluator: &mut Evaluator<E>,
    config: &ReviewConfig,
    before: &Board,
    played: ChessMove,
    move_number: u32,
) -> Result<Explained, ReviewError> {
    let candidates = evaluator
        .evaluate_top_k(before, config.deep, config.multipv)
        .await?;
    let standing = rank_played(played, &candidates, config);
    let best = &candidates[0];

    let explanation = match standing {
        Standing::Best => {
            Some(explain::best_move_comment(evaluator, config, before, played).await)
        }
        Standing::PracticallyEqual { .. }
        | Standing::StrongAlternative { .. }
        | Standing::RankedDistant { .. } => {
            Some(explain::alternative_comment(before, played, best, standing))
        }
        Standing::Unranked => {
            let delta = what_if_delta(evaluator, config, before, played, best.mv).await?;
            explain::unranked_comment(evaluator, config, before, played, best, delta, move_number)
                .await
        }
    };

    let pv = pv_line(before, &best.pv, move_number);
    Ok(Explained {
        explanation,
        best_move: best.san.clone(),
        principal_variation: (!pv.is_empty()).then_some(pv),
    })
}

/// Score difference between the played and reference what-if positions,
/// mover's perspective (negative = played is worse).
async fn what_if_delta<E: UciEngine>(
    evaluator: &mut Evaluator<E>,
    config: &ReviewConfig,
    before: &Board,
    played: ChessMove,
    reference: ChessMove,
) -> Result<i32, ReviewError> {
    let mover = before.side_to_move();
    let after_played = before.make_move_new(played);
    let after_reference = before.make_move_new(reference);

    let played_eval = evaluator.evaluate(&after_played, config.shallow).await?;
    let reference_eval = evaluator.evaluate(&after_reference, config.shallow).await?;

    Ok(played_eval.for_mover(mover) - reference_eval.for_mover(mover))
}

/// Format a principal variation as a numbered SAN line, at most four moves,
/// stopping at the first unresolvable move.
fn pv_line(board: &Board, pv: &[ChessMove], move_number: u32) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = *board;
    let mut number = move_number;

    for (i, mv) in pv.iter().take(4).enumerate() {
        if !current.legal(*mv) {
            break;
        }
        let san_move = san(&current, *mv);
        if current.side_to_move() == Color::White {
            parts.push(format!("{number}.{san_move}"));
        } else if i == 0 {
            parts.push(format!("{number}...{san_move}"));
        } else {
            parts.push(san_move);
        }
        current = current.make_move_new(*mv);
        if current.side_to_move() == Color::White {
            number += 1;
        }
    }

    parts.join(" ")
}
