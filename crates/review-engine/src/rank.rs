//! Standing of a played move relative to the engine's candidate list.

use chess::ChessMove;

use crate::config::ReviewConfig;
use crate::evaluate::CandidateMove;

/// How the played move relates to the top engine candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    /// The engine's first choice
    Best,
    /// Ranked, within the near-equal window of the top candidate
    PracticallyEqual { rank: usize },
    /// Ranked, within the strong-alternative window
    StrongAlternative { rank: usize },
    /// Ranked, but clearly behind the top candidate
    RankedDistant { rank: usize },
    /// Not among the requested candidates
    Unranked,
}

/// Place a played move among the engine's candidates. Candidates are in
/// engine preference order; scores are compared on resolved centipawns
/// (White's perspective, absolute difference).
pub fn rank_played(
    played: ChessMove,
    candidates: &[CandidateMove],
    config: &ReviewConfig,
) -> Standing {
    let rank = match candidates.iter().position(|c| c.mv == played) {
        Some(r) => r,
        None => return Standing::Unranked,
    };

    if rank == 0 {
        return Standing::Best;
    }

    let best_cp = candidates[0].evaluation.resolved_cp();
    let played_cp = candidates[rank].evaluation.resolved_cp();
    let gap = (played_cp - best_cp).abs();

    if gap < config.near_equal_cp {
        Standing::PracticallyEqual { rank }
    } else if gap < config.strong_alternative_cp {
        Standing::StrongAlternative { rank }
    } else {
        Standing::RankedDistant { rank }
    }
}
