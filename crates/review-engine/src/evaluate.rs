//! Bounded-effort engine queries, normalized to White's perspective.
//!
//! Every query that fails is retried once at reduced depth/time before an
//! `EngineQuery` error reaches the caller.

use chess::{Board, ChessMove};
use tracing::warn;

use crate::board::{parse_uci_move, san};
use crate::config::SearchLimits;
use crate::error::ReviewError;
use crate::score::Evaluation;
use crate::uci::{EngineLine, UciEngine};

/// One engine candidate for a position, in MultiPV preference order
/// (index 0 = engine's best). Never re-sorted by score.
#[derive(Debug, Clone)]
pub struct CandidateMove {
    pub mv: ChessMove,
    pub san: String,
    pub evaluation: Evaluation,
    pub pv: Vec<ChessMove>,
}

/// Wraps an engine handle with normalization and the single-retry policy.
/// Holding `&mut self` per query keeps the engine endpoint serialized.
pub struct Evaluator<E> {
    engine: E,
}

impl<E: UciEngine> Evaluator<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Score a position. Mate distances survive in the Evaluation; callers
    /// resolve them to centipawns when subtracting.
    pub async fn evaluate(
        &mut self,
        board: &Board,
        limits: SearchLimits,
    ) -> Result<Evaluation, ReviewError> {
        let lines = self.analyse_with_retry(board, limits, 1).await?;
        let line = lines
            .first()
            .ok_or_else(|| ReviewError::EngineQuery("Engine returned no analysis line".to_string()))?;
        Ok(Evaluation::from_engine(line.cp, line.mate, board.side_to_move()))
    }

    /// Top-k candidate moves for a position, engine order preserved.
    /// Lines whose PV head is missing or illegal are dropped.
    pub async fn evaluate_top_k(
        &mut self,
        board: &Board,
        limits: SearchLimits,
        k: u32,
    ) -> Result<Vec<CandidateMove>, ReviewError> {
        let lines = self.analyse_with_retry(board, limits, k).await?;

        let mut candidates = Vec::with_capacity(lines.len());
        for line in &lines {
            if let Some(candidate) = resolve_line(board, line) {
                candidates.push(candidate);
            }
        }

        if candidates.is_empty() {
            return Err(ReviewError::EngineQuery(
                "Engine returned no usable candidates".to_string(),
            ));
        }
        Ok(candidates)
    }

    /// Single raw engine line for best-effort probes (follow-up and
    /// lookahead commentary). No retry; callers treat failure as "nothing
    /// found".
    pub async fn probe_line(
        &mut self,
        board: &Board,
        limits: SearchLimits,
    ) -> Result<EngineLine, ReviewError> {
        let fen = board.to_string();
        let mut lines = self.engine.analyse(&fen, limits, 1).await?;
        if lines.is_empty() {
            return Err(ReviewError::EngineQuery(
                "Engine returned no analysis line".to_string(),
            ));
        }
        Ok(lines.remove(0))
    }

    /// Minimal best-move query (degraded fallback path).
    pub async fn best_move_only(
        &mut self,
        board: &Board,
        limits: SearchLimits,
    ) -> Result<ChessMove, ReviewError> {
        let fen = board.to_string();
        let uci = self.engine.play(&fen, limits).await?;
        parse_uci_move(board, &uci).ok_or_else(|| {
            ReviewError::EngineQuery(format!("Engine suggested illegal move: {uci}"))
        })
    }

    async fn analyse_with_retry(
        &mut self,
        board: &Board,
        limits: SearchLimits,
        multipv: u32,
    ) -> Result<Vec<EngineLine>, ReviewError> {
        let fen = board.to_string();
        match self.engine.analyse(&fen, limits, multipv).await {
            Ok(lines) => Ok(lines),
            Err(e) => {
                warn!(error = %e, depth = limits.depth, "Engine query failed, retrying reduced");
                self.engine.analyse(&fen, limits.reduced(), multipv).await
            }
        }
    }
}

/// Resolve a raw engine line into a candidate: legal PV head plus as much
/// of the PV as replays legally.
fn resolve_line(board: &Board, line: &EngineLine) -> Option<CandidateMove> {
    let first_uci = line.pv.first()?;
    let mv = parse_uci_move(board, first_uci)?;

    let mut pv = Vec::with_capacity(line.pv.len());
    let mut current = *board;
    for uci in &line.pv {
        match parse_uci_move(&current, uci) {
            Some(m) => {
                pv.push(m);
                current = current.make_move_new(m);
            }
            None => break,
        }
    }

    Some(CandidateMove {
        mv,
        san: san(board, mv),
        evaluation: Evaluation::from_engine(line.cp, line.mate, board.side_to_move()),
        pv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Color;

    #[test]
    fn test_resolve_line_replays_pv() {
        let board = Board::default();
        let line = EngineLine {
            pv: vec!["e2e4".to_string(), "e7e5".to_string(), "g1f3".to_string()],
            cp: Some(35),
            mate: None,
        };
        let candidate = resolve_line(&board, &line).unwrap();
        assert_eq!(candidate.san, "e4");
        assert_eq!(candidate.pv.len(), 3);
        assert_eq!(candidate.evaluation.cp, Some(35));
    }

    #[test]
    fn test_resolve_line_stops_at_illegal_pv_move() {
        let board = Board::default();
        let line = EngineLine {
            pv: vec!["e2e4".to_string(), "e2e4".to_string()],
            cp: Some(10),
            mate: None,
        };
        let candidate = resolve_line(&board, &line).unwrap();
        assert_eq!(candidate.pv.len(), 1);
    }

    #[test]
    fn test_resolve_line_normalizes_black_score() {
        let board = Board::default().make_move_new(
            parse_uci_move(&Board::default(), "e2e4").unwrap(),
        );
        assert_eq!(board.side_to_move(), Color::Black);
        let line = EngineLine {
            pv: vec!["e7e5".to_string()],
            cp: Some(25),
            mate: None,
        };
        let candidate = resolve_line(&board, &line).unwrap();
        // 25 for the side to move (Black) is -25 for White
        assert_eq!(candidate.evaluation.cp, Some(-25));
    }

    #[test]
    fn test_resolve_line_rejects_illegal_head() {
        let board = Board::default();
        let line = EngineLine {
            pv: vec!["e2e5".to_string()],
            cp: Some(0),
            mate: None,
        };
        assert!(resolve_line(&board, &line).is_none());
    }
}
