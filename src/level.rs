//! Level data: the serde descriptors read from disk, the runtime `Level`
//! built from them on every PLAY entry, and the `LevelManager` that owns
//! ordering.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entities::{
    Direction, Oscillation, PowerUp, PowerUpKind, Target, Turret, DEFAULT_OSCILLATION_SPEED,
};
use crate::error::{GameError, Result};

// ── Descriptors ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    #[serde(default)]
    pub ammo: u32,
    /// Tutorial lines shown on the INFO screen before the level starts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub briefing: Vec<String>,
    #[serde(default)]
    pub targets: Vec<TargetDef>,
    #[serde(default)]
    pub turrets: Vec<TurretDef>,
    #[serde(default)]
    pub powerups: Vec<PowerUpDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetDef {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub movement: Option<MotionDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurretDef {
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_direction")]
    pub direction: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerUpDef {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_value")]
    pub value: i32,
    #[serde(default)]
    pub movement: Option<MotionDef>,
}

/// Missing endpoints default to the entity's spawn point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionDef {
    #[serde(default)]
    pub start: Option<(i32, i32)>,
    #[serde(default)]
    pub end: Option<(i32, i32)>,
    #[serde(default)]
    pub speed: Option<f64>,
}

/// Largest magnitude a power-up `value` may carry. Speed power-ups must also
/// be positive.
pub const MAX_POWER_UP_VALUE: i32 = 100;

fn default_direction() -> String {
    "up".to_string()
}

fn default_value() -> i32 {
    1
}

impl MotionDef {
    fn build(&self, x: i32, y: i32) -> Oscillation {
        Oscillation::new(
            self.start.unwrap_or((x, y)),
            self.end.unwrap_or((x, y)),
            self.speed.unwrap_or(DEFAULT_OSCILLATION_SPEED),
        )
    }
}

impl TargetDef {
    fn build(&self) -> Target {
        let motion = self.movement.as_ref().map(|m| m.build(self.x, self.y));
        Target::new(self.x, self.y, motion)
    }
}

impl TurretDef {
    fn build(&self) -> Result<Turret> {
        let direction: Direction = self.direction.parse()?;
        Ok(Turret::new(self.x, self.y, direction))
    }
}

impl PowerUpDef {
    fn build(&self) -> Result<PowerUp> {
        let kind: PowerUpKind = self.kind.parse()?;
        let floor = match kind {
            PowerUpKind::Speed => 1,
            PowerUpKind::Hp | PowerUpKind::Ammo => -MAX_POWER_UP_VALUE,
        };
        if !(floor..=MAX_POWER_UP_VALUE).contains(&self.value) {
            return Err(GameError::PowerUpValue {
                kind: kind.to_string(),
                value: self.value,
            });
        }
        let motion = self.movement.as_ref().map(|m| m.build(self.x, self.y));
        Ok(PowerUp::new(kind, self.x, self.y, self.value, motion))
    }
}

// ── Runtime level ─────────────────────────────────────────────────────────────

/// A freshly built level. Entities start at full health in their authored
/// positions; only `ammo` and the entity flags change during play.
#[derive(Clone, Debug)]
pub struct Level {
    pub index: usize,
    pub targets: Vec<Target>,
    pub turrets: Vec<Turret>,
    pub powerups: Vec<PowerUp>,
    pub ammo: u32,
}

impl Level {
    /// Build level `index` from its descriptor. HP power-ups are skipped when
    /// `collected_hp` says this level already granted one.
    pub fn build(index: usize, def: &LevelDef, collected_hp: &BTreeSet<usize>) -> Result<Level> {
        let targets = def.targets.iter().map(TargetDef::build).collect();
        let turrets = def
            .turrets
            .iter()
            .map(TurretDef::build)
            .collect::<Result<Vec<_>>>()?;
        let mut powerups = def
            .powerups
            .iter()
            .map(PowerUpDef::build)
            .collect::<Result<Vec<_>>>()?;
        if collected_hp.contains(&index) {
            powerups.retain(|p| p.kind != PowerUpKind::Hp);
        }
        Ok(Level {
            index,
            targets,
            turrets,
            powerups,
            ammo: def.ammo,
        })
    }

    pub fn all_targets_dead(&self) -> bool {
        self.targets.iter().all(|t| t.dead)
    }

    pub fn any_target_alive(&self) -> bool {
        self.targets.iter().any(|t| !t.dead)
    }
}

// ── Manager ───────────────────────────────────────────────────────────────────

/// Ordered level definitions; the only place that knows how many levels exist.
#[derive(Clone, Debug, Default)]
pub struct LevelManager {
    defs: Vec<LevelDef>,
}

impl LevelManager {
    /// Every definition is built once up front so that bad power-up kinds or
    /// turret directions fail here rather than mid-game.
    pub fn new(defs: Vec<LevelDef>) -> Result<Self> {
        let empty = BTreeSet::new();
        for (index, def) in defs.iter().enumerate() {
            Level::build(index, def, &empty)?;
        }
        Ok(LevelManager { defs })
    }

    /// Read every `*.json` file in `dir`, ordered by numeric file stem.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|source| GameError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| GameError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(GameError::NoLevels(dir.to_path_buf()));
        }
        paths.sort_by_key(|p| level_order_key(p));

        let mut defs = Vec::with_capacity(paths.len());
        for path in &paths {
            let text = fs::read_to_string(path).map_err(|source| GameError::Io {
                path: path.clone(),
                source,
            })?;
            let def: LevelDef = serde_json::from_str(&text).map_err(|source| GameError::Json {
                path: path.clone(),
                source,
            })?;
            defs.push(def);
        }
        tracing::info!(dir = %dir.display(), count = defs.len(), "loaded level definitions");
        LevelManager::new(defs)
    }

    pub fn count(&self) -> usize {
        self.defs.len()
    }

    pub fn get(&self, index: usize) -> Result<&LevelDef> {
        self.defs.get(index).ok_or(GameError::LevelOutOfRange {
            index,
            count: self.defs.len(),
        })
    }

    pub fn load(&self, index: usize, collected_hp: &BTreeSet<usize>) -> Result<Level> {
        let level = Level::build(index, self.get(index)?, collected_hp)?;
        tracing::info!(
            level = index,
            targets = level.targets.len(),
            turrets = level.turrets.len(),
            powerups = level.powerups.len(),
            ammo = level.ammo,
            "level loaded"
        );
        Ok(level)
    }

    /// The level after `index`, or `None` when `index` is the last one.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        (next < self.defs.len()).then_some(next)
    }

    pub fn has_briefing(&self, index: usize) -> bool {
        self.defs
            .get(index)
            .is_some_and(|def| !def.briefing.is_empty())
    }
}

/// Numeric stems first in numeric order, then everything else by name.
fn level_order_key(path: &Path) -> (u8, u64, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.parse::<u64>() {
        Ok(n) => (0, n, stem),
        Err(_) => (1, 0, stem),
    }
}
