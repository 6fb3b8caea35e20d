use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub event: String,
    pub date: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
}

impl Default for GameMetadata {
    fn default() -> Self {
        Self {
            white: "Unknown".to_string(),
            black: "Unknown".to_string(),
            event: "Unknown".to_string(),
            date: "Unknown".to_string(),
            result: "*".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN notation, main line only
}
