//! Game entity types and their per-tick behaviour.
//!
//! Everything here works in playfield pixel units with the origin at the
//! top-left corner. Rendering concerns stay in `display`.

use std::fmt;
use std::str::FromStr;

use crate::error::GameError;
use crate::input::HeldKeys;

// ── Geometry constants ────────────────────────────────────────────────────────

pub const FIELD_WIDTH: i32 = 512;
pub const FIELD_HEIGHT: i32 = 768;

pub const SHIP_SIZE: i32 = 64;
pub const SHIP_SPEED: i32 = 5;
/// Distance from the bottom of the playfield to the bottom of the ship.
pub const SHIP_BOTTOM_MARGIN: i32 = 100;

pub const TARGET_SIZE: i32 = 64;
pub const TURRET_SIZE: i32 = 64;
pub const POWER_UP_SIZE: i32 = 56;
pub const PROJECTILE_SIZE: i32 = 48;

pub const DEFAULT_HP: i32 = 3;
pub const MAX_HP: i32 = 5;

pub const DEFAULT_BULLET_SPEED: i32 = 16;
pub const TURRET_BULLET_SPEED: i32 = 16;
pub const DEFAULT_OSCILLATION_SPEED: f64 = 0.01;

// ── Rect ──────────────────────────────────────────────────────────────────────

/// Axis-aligned box: top-left corner plus size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    /// The whole playfield.
    pub const fn field() -> Self {
        Rect::new(0, 0, FIELD_WIDTH, FIELD_HEIGHT)
    }

    /// A box of the given size whose centre sits on `(cx, cy)`.
    pub fn centered(cx: i32, cy: i32, w: i32, h: i32) -> Self {
        Rect::new(cx - w / 2, cy - h / 2, w, h)
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }

    /// Strict overlap; boxes that only share an edge do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// True once no part of the box is left inside `bounds`.
    pub fn is_outside(&self, bounds: &Rect) -> bool {
        self.right() < bounds.x
            || self.x > bounds.right()
            || self.bottom() < bounds.y
            || self.y > bounds.bottom()
    }

    /// Move the box the minimum distance needed to sit inside `bounds`.
    pub fn clamp_within(&mut self, bounds: &Rect) {
        self.x = self.x.max(bounds.x).min(bounds.right() - self.w);
        self.y = self.y.max(bounds.y).min(bounds.bottom() - self.h);
    }
}

// ── Direction / tags ──────────────────────────────────────────────────────────

/// One of the four cardinal firing directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Any combination that is not a pure cardinal vector falls back to `Up`.
    pub fn from_vector(dx: i32, dy: i32) -> Self {
        match (dx, dy) {
            (0, dy) if dy > 0 => Direction::Down,
            (dx, 0) if dx < 0 => Direction::Left,
            (dx, 0) if dx > 0 => Direction::Right,
            _ => Direction::Up,
        }
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(GameError::UnknownDirection(other.to_string())),
        }
    }
}

/// Cosmetic ship lean, driven by the last movement input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Facing {
    Left,
    #[default]
    Idle,
    Right,
}

/// Who fired a projectile. Turret shots never damage turrets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Player,
    Cannon,
}

// ── Oscillation ───────────────────────────────────────────────────────────────

/// Ping-pong interpolation between two points.
#[derive(Clone, Debug, PartialEq)]
pub struct Oscillation {
    pub start: (i32, i32),
    pub end: (i32, i32),
    pub speed: f64,
    /// Always within `[0, 1]`.
    pub progress: f64,
    /// `1.0` while heading towards `end`, `-1.0` on the way back.
    pub heading: f64,
}

impl Oscillation {
    pub fn new(start: (i32, i32), end: (i32, i32), speed: f64) -> Self {
        Oscillation {
            start,
            end,
            speed,
            progress: 0.0,
            heading: 1.0,
        }
    }

    /// Advance one tick and return the new top-left position.
    pub fn advance(&mut self) -> (i32, i32) {
        self.progress += self.heading * self.speed;
        if self.progress >= 1.0 {
            self.progress = 1.0;
            self.heading = -1.0;
        } else if self.progress <= 0.0 {
            self.progress = 0.0;
            self.heading = 1.0;
        }
        self.position()
    }

    pub fn position(&self) -> (i32, i32) {
        (
            lerp(self.start.0, self.end.0, self.progress),
            lerp(self.start.1, self.end.1, self.progress),
        )
    }
}

fn lerp(a: i32, b: i32, t: f64) -> i32 {
    let (a, b) = (a as f64, b as f64);
    (a + (b - a) * t) as i32
}

// ── Ship ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Ship {
    pub rect: Rect,
    pub speed: i32,
    pub facing: Facing,
}

impl Ship {
    /// A ship centred horizontally near the bottom of `field`.
    pub fn new(field: &Rect) -> Self {
        let x = field.center_x() - SHIP_SIZE / 2;
        let y = field.bottom() - SHIP_BOTTOM_MARGIN - SHIP_SIZE;
        Ship {
            rect: Rect::new(x, y, SHIP_SIZE, SHIP_SIZE),
            speed: SHIP_SPEED,
            facing: Facing::Idle,
        }
    }

    /// Horizontal movement only; left wins when both keys are held.
    pub fn update(&mut self, held: HeldKeys, field: &Rect) {
        if held.left {
            self.rect.x -= self.speed;
            self.facing = Facing::Left;
        } else if held.right {
            self.rect.x += self.speed;
            self.facing = Facing::Right;
        } else {
            self.facing = Facing::Idle;
        }
        self.rect.clamp_within(field);
    }

    /// Spawn point for a player shot: centre of the ship's nose.
    pub fn muzzle(&self) -> (i32, i32) {
        (self.rect.center_x(), self.rect.y)
    }
}

// ── Projectile ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Projectile {
    pub rect: Rect,
    pub direction: Direction,
    pub speed: i32,
    pub active: bool,
    pub source: Source,
}

impl Projectile {
    /// A projectile centred on `(cx, cy)`.
    pub fn new(cx: i32, cy: i32, direction: Direction, speed: i32, source: Source) -> Self {
        Projectile {
            rect: Rect::centered(cx, cy, PROJECTILE_SIZE, PROJECTILE_SIZE),
            direction,
            speed,
            active: true,
            source,
        }
    }

    pub fn update(&mut self, field: &Rect) {
        let (dx, dy) = self.direction.vector();
        self.rect.x += dx * self.speed;
        self.rect.y += dy * self.speed;
        if self.rect.is_outside(field) {
            self.active = false;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

// ── Target ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Target {
    pub rect: Rect,
    pub dead: bool,
    pub motion: Option<Oscillation>,
}

impl Target {
    pub fn new(x: i32, y: i32, motion: Option<Oscillation>) -> Self {
        Target {
            rect: Rect::new(x, y, TARGET_SIZE, TARGET_SIZE),
            dead: false,
            motion,
        }
    }

    pub fn update(&mut self) {
        if self.dead {
            return;
        }
        if let Some(motion) = self.motion.as_mut() {
            let (x, y) = motion.advance();
            self.rect.x = x;
            self.rect.y = y;
        }
    }

    /// Returns `true` only on the hit that kills the target.
    pub fn hit(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        true
    }
}

// ── Turret ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Turret {
    pub rect: Rect,
    pub direction: Direction,
    pub active: bool,
}

impl Turret {
    pub fn new(x: i32, y: i32, direction: Direction) -> Self {
        Turret {
            rect: Rect::new(x, y, TURRET_SIZE, TURRET_SIZE),
            direction,
            active: true,
        }
    }

    /// One shot from the turret's centre, or nothing once destroyed.
    pub fn fire(&self) -> Option<Projectile> {
        if !self.active {
            return None;
        }
        Some(Projectile::new(
            self.rect.center_x(),
            self.rect.center_y(),
            self.direction,
            TURRET_BULLET_SPEED,
            Source::Cannon,
        ))
    }

    /// Returns `true` only on the hit that destroys the turret.
    pub fn hit(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        true
    }
}

// ── Power-ups ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerUpKind {
    /// Restores HP, capped at `MAX_HP`.
    Hp,
    /// Adds to the level's remaining ammunition.
    Ammo,
    /// Makes every later player shot faster for the rest of the run.
    Speed,
}

impl FromStr for PowerUpKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hp" => Ok(PowerUpKind::Hp),
            "ammo" => Ok(PowerUpKind::Ammo),
            "speed" => Ok(PowerUpKind::Speed),
            other => Err(GameError::UnknownPowerUp(other.to_string())),
        }
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerUpKind::Hp => write!(f, "hp"),
            PowerUpKind::Ammo => write!(f, "ammo"),
            PowerUpKind::Speed => write!(f, "speed"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PowerUp {
    pub rect: Rect,
    pub kind: PowerUpKind,
    pub value: i32,
    pub collected: bool,
    pub motion: Option<Oscillation>,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, x: i32, y: i32, value: i32, motion: Option<Oscillation>) -> Self {
        PowerUp {
            rect: Rect::new(x, y, POWER_UP_SIZE, POWER_UP_SIZE),
            kind,
            value,
            collected: false,
            motion,
        }
    }

    pub fn update(&mut self) {
        if self.collected {
            return;
        }
        if let Some(motion) = self.motion.as_mut() {
            let (x, y) = motion.advance();
            self.rect.x = x;
            self.rect.y = y;
        }
    }

    /// Returns `true` only on the first collection.
    pub fn collect(&mut self) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        true
    }
}
