//! Load-time failures. Gameplay outcomes (losing, running out of lives) are
//! never errors; everything here means the level or score data is unusable.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("level index {index} out of range (have {count} levels)")]
    LevelOutOfRange { index: usize, count: usize },

    #[error("unknown power-up kind: {0}")]
    UnknownPowerUp(String),

    #[error("{kind} power-up value {value} out of range")]
    PowerUpValue { kind: String, value: i32 },

    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    #[error("no level files found in {}", .0.display())]
    NoLevels(PathBuf),

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, GameError>;
