//! Scoring: the per-run ledger of unused ammunition and the persisted
//! top-ten leaderboard.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

pub const MAX_SCORES: usize = 10;
pub const MAX_NAME_LEN: usize = 10;

const HP_POINTS: i32 = 100;
const AMMO_POINTS: i32 = 10;

// ── Ledger ────────────────────────────────────────────────────────────────────

/// Unused ammunition banked at the end of every cleared level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreLedger {
    pub unused_ammo: u32,
}

impl ScoreLedger {
    pub fn bank(&mut self, ammo: u32) {
        self.unused_ammo += ammo;
    }

    pub fn final_score(&self, hp: i32) -> i32 {
        hp * HP_POINTS + self.unused_ammo as i32 * AMMO_POINTS
    }
}

// ── Leaderboard ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: i32,
    /// Seconds since the Unix epoch.
    pub ts: f64,
}

/// Sorted by descending score, at most `MAX_SCORES` long.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    pub fn new(mut entries: Vec<ScoreEntry>) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_SCORES);
        Leaderboard { entries }
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Insert a result. Ties keep the older entry first.
    pub fn insert(&mut self, name: &str, score: i32, ts: f64) {
        self.entries.push(ScoreEntry {
            name: name.chars().take(MAX_NAME_LEN).collect(),
            score,
            ts,
        });
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_SCORES);
    }
}

pub fn now_ts() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ── Persistence ───────────────────────────────────────────────────────────────

/// Where the leaderboard lives between runs.
pub trait ScoreStore {
    fn load(&self) -> Result<Leaderboard>;

    /// Record a result and return the updated board.
    fn save(&mut self, name: &str, score: i32) -> Result<Leaderboard>;
}

/// A JSON array of `{name, score, ts}` on disk.
#[derive(Clone, Debug)]
pub struct JsonScoreStore {
    path: PathBuf,
}

impl JsonScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonScoreStore { path: path.into() }
    }

    fn io_err(&self, source: std::io::Error) -> GameError {
        GameError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ScoreStore for JsonScoreStore {
    fn load(&self) -> Result<Leaderboard> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Leaderboard::default()),
            Err(e) => return Err(self.io_err(e)),
        };
        let entries: Vec<ScoreEntry> =
            serde_json::from_str(&text).map_err(|source| GameError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(Leaderboard::new(entries))
    }

    fn save(&mut self, name: &str, score: i32) -> Result<Leaderboard> {
        let mut board = self.load()?;
        board.insert(name, score, now_ts());
        let text = serde_json::to_string(&board).map_err(|source| GameError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, text).map_err(|e| self.io_err(e))?;
        tracing::info!(path = %self.path.display(), name, score, "score saved");
        Ok(board)
    }
}

/// Keeps the board in memory only.
#[derive(Clone, Debug, Default)]
pub struct MemoryScoreStore {
    board: Leaderboard,
}

impl MemoryScoreStore {
    pub fn new(board: Leaderboard) -> Self {
        MemoryScoreStore { board }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load(&self) -> Result<Leaderboard> {
        Ok(self.board.clone())
    }

    fn save(&mut self, name: &str, score: i32) -> Result<Leaderboard> {
        self.board.insert(name, score, now_ts());
        Ok(self.board.clone())
    }
}
