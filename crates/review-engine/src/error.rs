//! Review error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    /// The engine process could not be spawned or failed the UCI handshake.
    /// Fatal: the whole review is abandoned.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The input could not be parsed into a move sequence. Fatal.
    #[error("Game unreadable: {0}")]
    GameUnreadable(String),

    /// A single engine query failed or timed out, after the internal retry.
    #[error("Engine query failed: {0}")]
    EngineQuery(String),

    /// A failure while analyzing one ply; recorded on that move, never fatal.
    #[error("Move analysis error: {0}")]
    MoveAnalysis(String),
}
