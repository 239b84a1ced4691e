//! The PLAY simulation.
//!
//! `tick` advances an `Arena` by exactly one frame in a fixed order and
//! reports every terminal condition it met, in the order it met them. It
//! never returns early: a hit on the ship still lets the rest of the frame
//! run, and the caller decides what the sequence of verdicts means.

use crate::entities::{Direction, PowerUpKind, Projectile, Rect, Ship, Source, MAX_HP};
use crate::input::HeldKeys;
use crate::level::Level;
use crate::session::Run;

/// Everything that exists while a level is being played.
#[derive(Clone, Debug)]
pub struct Arena {
    pub level: Level,
    pub ship: Ship,
    pub player_shots: Vec<Projectile>,
    pub enemy_shots: Vec<Projectile>,
    /// May go negative; the caller routes that to GLOBAL_LOSE.
    pub hp: i32,
    pub field: Rect,
    pub frame: u64,
}

/// A terminal condition raised during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The player lost one HP; `hp` is the value after the loss.
    Lost { hp: i32 },
    /// Every target is dead and unused ammunition has been banked.
    Cleared { hp: i32 },
}

// ── Constructors ─────────────────────────────────────────────────────────────

pub fn init_arena(level: Level, hp: i32, field: Rect) -> Arena {
    Arena {
        ship: Ship::new(&field),
        level,
        player_shots: Vec::new(),
        enemy_shots: Vec::new(),
        hp,
        field,
        frame: 0,
    }
}

// ── Input-driven actions ────────────────────────────────────────────────────

/// Spend one round on a player shot, and let every live turret answer with
/// one shot of its own. Without ammunition nothing happens at all.
pub fn player_fire(arena: &mut Arena, run: &Run) -> bool {
    if arena.level.ammo == 0 {
        return false;
    }
    arena.level.ammo -= 1;

    let (x, y) = arena.ship.muzzle();
    arena.player_shots.push(Projectile::new(
        x,
        y,
        Direction::Up,
        run.bullet_speed,
        Source::Player,
    ));

    let volley = arena.level.turrets.iter().filter_map(|t| t.fire());
    arena.enemy_shots.extend(volley);
    tracing::trace!(
        ammo = arena.level.ammo,
        enemy_shots = arena.enemy_shots.len(),
        "player fired"
    );
    true
}

/// Apply a collected power-up's effect.
pub fn apply_power_up(arena: &mut Arena, run: &mut Run, kind: PowerUpKind, value: i32) {
    match kind {
        PowerUpKind::Hp => {
            arena.hp = arena.hp.saturating_add(value).min(MAX_HP);
            run.collected_hp.insert(arena.level.index);
        }
        PowerUpKind::Ammo => {
            arena.level.ammo = (arena.level.ammo as i64 + value as i64).max(0) as u32;
        }
        PowerUpKind::Speed => {
            run.bullet_speed = run.bullet_speed.saturating_add(value.saturating_mul(2)).max(1);
        }
    }
    tracing::debug!(%kind, value, hp = arena.hp, ammo = arena.level.ammo, "power-up collected");
}

/// Bank the level's unused ammunition and report the clear.
pub fn advance(arena: &Arena, run: &mut Run) -> Verdict {
    run.ledger.bank(arena.level.ammo);
    Verdict::Cleared { hp: arena.hp }
}

// ── Per-frame tick ───────────────────────────────────────────────────────────

pub fn tick(arena: &mut Arena, held: HeldKeys, run: &mut Run) -> Vec<Verdict> {
    let mut verdicts = Vec::new();
    let field = arena.field;
    arena.frame += 1;

    // ── 1. Ship ──────────────────────────────────────────────────────────────
    arena.ship.update(held, &field);

    // ── 2. Targets ───────────────────────────────────────────────────────────
    for target in &mut arena.level.targets {
        target.update();
    }

    // ── 3. Player shots ──────────────────────────────────────────────────────
    for shot in &mut arena.player_shots {
        shot.update(&field);
    }

    // ── 4. Power-ups ─────────────────────────────────────────────────────────
    for powerup in &mut arena.level.powerups {
        powerup.update();
    }

    // ── 5. Player shots ↔ targets ────────────────────────────────────────────
    // Dead targets still swallow shots that touch them.
    for shot in &mut arena.player_shots {
        for target in &mut arena.level.targets {
            if shot.rect.overlaps(&target.rect) {
                if target.hit() {
                    tracing::debug!(frame = arena.frame, "target destroyed");
                }
                shot.deactivate();
            }
        }
    }

    // ── 6. Player shots ↔ turrets ────────────────────────────────────────────
    for shot in &mut arena.player_shots {
        for turret in &mut arena.level.turrets {
            if shot.rect.overlaps(&turret.rect) {
                if turret.hit() {
                    tracing::debug!(frame = arena.frame, "turret destroyed");
                }
                shot.deactivate();
            }
        }
    }

    // ── 7. Player shots ↔ power-ups ──────────────────────────────────────────
    let mut pickups = Vec::new();
    for shot in arena.player_shots.iter_mut().filter(|s| s.active) {
        for powerup in &mut arena.level.powerups {
            if !shot.active {
                break;
            }
            if shot.rect.overlaps(&powerup.rect) && powerup.collect() {
                pickups.push((powerup.kind, powerup.value));
                shot.deactivate();
            }
        }
    }
    for (kind, value) in pickups {
        apply_power_up(arena, run, kind, value);
    }

    // ── 8. Prune spent player shots ──────────────────────────────────────────
    arena.player_shots.retain(|s| s.active);

    // ── 9. Enemy shots ───────────────────────────────────────────────────────
    for shot in &mut arena.enemy_shots {
        shot.update(&field);
    }
    arena.enemy_shots.retain(|s| s.active);

    // ── 10. Enemy shots ↔ ship ───────────────────────────────────────────────
    for shot in &mut arena.enemy_shots {
        if shot.active && shot.rect.overlaps(&arena.ship.rect) {
            shot.deactivate();
            arena.hp -= 1;
            tracing::debug!(frame = arena.frame, hp = arena.hp, "ship hit");
            verdicts.push(Verdict::Lost { hp: arena.hp });
        }
    }

    // ── 11. Enemy shots ↔ targets / turrets ──────────────────────────────────
    for shot in &mut arena.enemy_shots {
        for target in &mut arena.level.targets {
            if shot.rect.overlaps(&target.rect) {
                target.hit();
                shot.deactivate();
            }
        }
        if shot.source == Source::Cannon {
            continue;
        }
        for turret in &mut arena.level.turrets {
            if shot.rect.overlaps(&turret.rect) {
                turret.hit();
                shot.deactivate();
            }
        }
    }
    arena.enemy_shots.retain(|s| s.active);

    // ── 12. Terminal conditions ──────────────────────────────────────────────
    if arena.level.ammo == 0 && arena.player_shots.is_empty() && arena.level.any_target_alive() {
        arena.hp -= 1;
        tracing::debug!(frame = arena.frame, hp = arena.hp, "out of ammunition");
        verdicts.push(Verdict::Lost { hp: arena.hp });
    } else if arena.level.all_targets_dead() {
        verdicts.push(advance(arena, run));
    }

    verdicts
}
