//! Position evaluation, stored canonically from White's perspective.

use chess::Color;
use serde::{Deserialize, Serialize};

/// Mate distances map beyond this band so they outrank any finite score
const MATE_BASE: i32 = 10_000;

/// A single position evaluation. Exactly one of `cp`/`mate` is set for a
/// real engine score; both absent means the engine reported nothing usable
/// (treated as 0).
///
/// Always from White's perspective; the engine boundary normalizes the UCI
/// side-to-move convention before an Evaluation is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cp: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mate: Option<i32>,
}

impl Evaluation {
    pub fn cp(cp: i32) -> Self {
        Self {
            cp: Some(cp),
            mate: None,
        }
    }

    pub fn mate(moves: i32) -> Self {
        Self {
            cp: None,
            mate: Some(moves),
        }
    }

    /// Build from raw engine output reported from the side to move's
    /// perspective, negating when Black is to move.
    pub fn from_engine(cp: Option<i32>, mate: Option<i32>, side_to_move: Color) -> Self {
        let sign = match side_to_move {
            Color::White => 1,
            Color::Black => -1,
        };
        if let Some(m) = mate {
            Self::mate(m * sign)
        } else if let Some(c) = cp {
            Self::cp(c * sign)
        } else {
            Self { cp: None, mate: None }
        }
    }

    /// Centipawn value with mate distances mapped to extreme finite values,
    /// so any mate-for-White outscores any finite advantage and shorter
    /// mates outscore longer ones.
    pub fn resolved_cp(&self) -> i32 {
        if let Some(m) = self.mate {
            if m > 0 {
                MATE_BASE - m * 10
            } else {
                -MATE_BASE - m * 10
            }
        } else {
            self.cp.unwrap_or(0)
        }
    }

    /// Resolved centipawns from the mover's perspective.
    pub fn for_mover(&self, mover: Color) -> i32 {
        match mover {
            Color::White => self.resolved_cp(),
            Color::Black => -self.resolved_cp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_normalization() {
        // White to move: kept as-is
        let eval = Evaluation::from_engine(Some(35), None, Color::White);
        assert_eq!(eval.cp, Some(35));

        // Black to move: a score in Black's favor is negative for White
        let eval = Evaluation::from_engine(Some(35), None, Color::Black);
        assert_eq!(eval.cp, Some(-35));

        let eval = Evaluation::from_engine(None, Some(3), Color::Black);
        assert_eq!(eval.mate, Some(-3));
        assert_eq!(eval.cp, None);
    }

    #[test]
    fn test_mate_outranks_finite_scores() {
        assert!(Evaluation::mate(5).resolved_cp() > Evaluation::cp(2500).resolved_cp());
        assert!(Evaluation::mate(-5).resolved_cp() < Evaluation::cp(-2500).resolved_cp());

        // Shorter mates are better
        assert!(Evaluation::mate(1).resolved_cp() > Evaluation::mate(5).resolved_cp());
        assert!(Evaluation::mate(-1).resolved_cp() < Evaluation::mate(-5).resolved_cp());
    }

    #[test]
    fn test_for_mover_negates_for_black() {
        let eval = Evaluation::cp(120);
        assert_eq!(eval.for_mover(Color::White), 120);
        assert_eq!(eval.for_mover(Color::Black), -120);
    }

    #[test]
    fn test_empty_resolves_to_zero() {
        let eval = Evaluation::from_engine(None, None, Color::White);
        assert_eq!(eval.resolved_cp(), 0);
    }
}
