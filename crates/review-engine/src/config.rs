//! Review configuration: engine path, search profiles and classification
//! thresholds, loaded from environment variables with sensible defaults.
//!
//! Everything tunable lives here; no module-level mutable state.

use std::env;

/// Bounded search effort for one engine query.
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub depth: u32,
    pub movetime_ms: u64,
}

impl SearchLimits {
    pub const fn new(depth: u32, movetime_ms: u64) -> Self {
        Self { depth, movetime_ms }
    }

    /// Limits for the single retry after a failed query.
    pub fn reduced(self) -> Self {
        Self {
            depth: (self.depth / 2).max(1),
            movetime_ms: (self.movetime_ms / 2).max(50),
        }
    }
}

/// Centipawn-loss thresholds for move classification (mover's perspective,
/// negative = lost ground).
#[derive(Debug, Clone, Copy)]
pub struct ClassifyThresholds {
    pub blunder: i32,
    pub mistake: i32,
    pub inaccuracy: i32,
}

impl Default for ClassifyThresholds {
    fn default() -> Self {
        Self {
            blunder: -300,
            mistake: -100,
            inaccuracy: -50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Path to the UCI engine binary
    pub engine_path: String,

    /// Per-ply score trail
    pub shallow: SearchLimits,

    /// Best-move / alternative analysis (MultiPV)
    pub deep: SearchLimits,

    /// Follow-up line behind a best move
    pub followup: SearchLimits,

    /// Last-resort tactical lookahead
    pub probe: SearchLimits,

    /// Degraded best-move-only fallback
    pub rescue: SearchLimits,

    /// Classification thresholds
    pub thresholds: ClassifyThresholds,

    /// Candidates requested for the alternatives check
    pub multipv: u32,

    /// |played − best| below this is a practically equal alternative
    pub near_equal_cp: i32,

    /// |played − best| below this is a strong alternative
    pub strong_alternative_cp: i32,

    /// Score delta at which a missed capture counts as material
    pub material_cp: i32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            engine_path: "/usr/local/bin/stockfish".to_string(),
            shallow: SearchLimits::new(18, 500),
            deep: SearchLimits::new(30, 2000),
            followup: SearchLimits::new(18, 300),
            probe: SearchLimits::new(8, 100),
            rescue: SearchLimits::new(10, 100),
            thresholds: ClassifyThresholds::default(),
            multipv: 3,
            near_equal_cp: 20,
            strong_alternative_cp: 50,
            material_cp: 100,
        }
    }
}

impl ReviewConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var("STOCKFISH_PATH") {
            config.engine_path = path;
        }
        if let Some(depth) = env_u32("SHALLOW_DEPTH") {
            config.shallow.depth = depth;
        }
        if let Some(ms) = env_u64("SHALLOW_MOVETIME_MS") {
            config.shallow.movetime_ms = ms;
        }
        if let Some(depth) = env_u32("DEEP_DEPTH") {
            config.deep.depth = depth;
        }
        if let Some(ms) = env_u64("DEEP_MOVETIME_MS") {
            config.deep.movetime_ms = ms;
        }

        config
    }
}

fn env_u32(name: &str) -> Option<u32> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profiles() {
        let config = ReviewConfig::default();
        assert_eq!(config.shallow.depth, 18);
        assert_eq!(config.shallow.movetime_ms, 500);
        assert_eq!(config.deep.depth, 30);
        assert_eq!(config.deep.movetime_ms, 2000);
        assert_eq!(config.multipv, 3);
    }

    #[test]
    fn test_reduced_limits() {
        let limits = SearchLimits::new(30, 2000).reduced();
        assert_eq!(limits.depth, 15);
        assert_eq!(limits.movetime_ms, 1000);

        // Reduction never reaches zero
        let tiny = SearchLimits::new(1, 50).reduced();
        assert_eq!(tiny.depth, 1);
        assert_eq!(tiny.movetime_ms, 50);
    }
}
