//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::entities::Rect;

#[derive(Parser, Debug, Clone)]
#[command(name = "target_shooter")]
#[command(about = "Clear every target before the ammunition runs out")]
pub struct Args {
    /// Directory holding the level files (1.json, 2.json, ...)
    #[arg(long, default_value = "levels")]
    pub levels: PathBuf,

    /// Leaderboard file, created on first save
    #[arg(long, default_value = "scores.json")]
    pub scores: PathBuf,

    /// Log output; the terminal itself is the game screen
    #[arg(long, default_value = "target_shooter.log")]
    pub log_file: PathBuf,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Skip the title screen and start at this level index
    #[arg(long)]
    pub start_level: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub levels_dir: PathBuf,
    pub scores_file: PathBuf,
    pub log_file: PathBuf,
    pub fps: u32,
    pub start_level: Option<usize>,
    pub field: Rect,
}

impl Settings {
    pub fn frame(&self) -> Duration {
        Duration::from_secs(1) / self.fps
    }
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Settings {
            levels_dir: args.levels,
            scores_file: args.scores,
            log_file: args.log_file,
            fps: args.fps,
            start_level: args.start_level,
            field: Rect::field(),
        }
    }
}
