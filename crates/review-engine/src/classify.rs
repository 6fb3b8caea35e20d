//! Move quality classification — pure functions only

use serde::{Deserialize, Serialize};

use crate::config::ClassifyThresholds;

/// Quality tiers, ordered most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Blunder,
    Mistake,
    Inaccuracy,
    Good,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Blunder => "blunder",
            QualityTier::Mistake => "mistake",
            QualityTier::Inaccuracy => "inaccuracy",
            QualityTier::Good => "good",
        }
    }
}

/// Classify a move from the mover-perspective score delta across it
/// (negative = the move lost ground). Thresholds checked most severe first.
pub fn classify(delta_cp: i32, thresholds: &ClassifyThresholds) -> QualityTier {
    if delta_cp <= thresholds.blunder {
        QualityTier::Blunder
    } else if delta_cp <= thresholds.mistake {
        QualityTier::Mistake
    } else if delta_cp <= thresholds.inaccuracy {
        QualityTier::Inaccuracy
    } else {
        QualityTier::Good
    }
}
