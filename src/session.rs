//! The long-lived context every state borrows. It outlives individual state
//! objects, so anything that must survive a transition lives here.

use std::collections::BTreeSet;

use crate::entities::{Rect, DEFAULT_BULLET_SPEED};
use crate::level::LevelManager;
use crate::score::{ScoreLedger, ScoreStore};

/// Progress of one play-through. Reset whenever a fresh game starts:
/// after GLOBAL_LOSE and after the leaderboard screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub ledger: ScoreLedger,
    /// Level indices whose HP power-up has already been taken.
    pub collected_hp: BTreeSet<usize>,
    /// Speed given to newly fired player shots.
    pub bullet_speed: i32,
}

impl Default for Run {
    fn default() -> Self {
        Run {
            ledger: ScoreLedger::default(),
            collected_hp: BTreeSet::new(),
            bullet_speed: DEFAULT_BULLET_SPEED,
        }
    }
}

pub struct Session {
    pub levels: LevelManager,
    pub run: Run,
    pub scores: Box<dyn ScoreStore>,
    pub field: Rect,
    quit: bool,
}

impl Session {
    pub fn new(levels: LevelManager, scores: Box<dyn ScoreStore>) -> Self {
        Session {
            levels,
            run: Run::default(),
            scores,
            field: Rect::field(),
            quit: false,
        }
    }

    pub fn new_game(&mut self) {
        tracing::info!(
            banked_ammo = self.run.ledger.unused_ammo,
            "starting a fresh run"
        );
        self.run = Run::default();
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }
}
