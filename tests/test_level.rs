use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use target_shooter::entities::{Direction, PowerUpKind};
use target_shooter::error::GameError;
use target_shooter::level::*;

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("write level file");
}

// ── Parsing ───────────────────────────────────────────────────────────────────

#[test]
fn descriptor_defaults() {
    let def: LevelDef = serde_json::from_str(
        r#"{
            "targets": [{"x": 1, "y": 2}],
            "turrets": [{"x": 3, "y": 4}],
            "powerups": [{"type": "ammo", "x": 5, "y": 6}]
        }"#,
    )
    .unwrap();
    assert_eq!(def.ammo, 0);
    assert!(def.briefing.is_empty());
    assert_eq!(def.turrets[0].direction, "up");
    assert_eq!(def.powerups[0].value, 1);

    let level = Level::build(0, &def, &BTreeSet::new()).unwrap();
    assert_eq!(level.turrets[0].direction, Direction::Up);
    assert_eq!(level.powerups[0].kind, PowerUpKind::Ammo);
    assert!(level.targets[0].motion.is_none());
}

#[test]
fn movement_endpoints_default_to_spawn() {
    let def: LevelDef = serde_json::from_str(
        r#"{"targets": [{"x": 10, "y": 20, "movement": {"end": [110, 20]}}]}"#,
    )
    .unwrap();
    let level = Level::build(0, &def, &BTreeSet::new()).unwrap();
    let motion = level.targets[0].motion.as_ref().expect("motion");
    assert_eq!(motion.start, (10, 20));
    assert_eq!(motion.end, (110, 20));
    assert!((motion.speed - 0.01).abs() < f64::EPSILON);
}

#[test]
fn unknown_power_up_is_fatal() {
    let def: LevelDef =
        serde_json::from_str(r#"{"powerups": [{"type": "shield", "x": 0, "y": 0}]}"#).unwrap();
    let err = LevelManager::new(vec![def]).unwrap_err();
    assert!(matches!(err, GameError::UnknownPowerUp(k) if k == "shield"));
}

#[test]
fn out_of_range_power_up_values_are_fatal() {
    for body in [
        r#"{"powerups": [{"type": "hp", "x": 0, "y": 0, "value": 2147483647}]}"#,
        r#"{"powerups": [{"type": "ammo", "x": 0, "y": 0, "value": -101}]}"#,
        r#"{"powerups": [{"type": "speed", "x": 0, "y": 0, "value": 0}]}"#,
        r#"{"powerups": [{"type": "speed", "x": 0, "y": 0, "value": -8}]}"#,
    ] {
        let def: LevelDef = serde_json::from_str(body).unwrap();
        assert!(
            matches!(LevelManager::new(vec![def]), Err(GameError::PowerUpValue { .. })),
            "accepted {body}"
        );
    }

    let def: LevelDef = serde_json::from_str(
        r#"{"powerups": [
            {"type": "hp", "x": 0, "y": 0, "value": 100},
            {"type": "ammo", "x": 0, "y": 0, "value": -100},
            {"type": "speed", "x": 0, "y": 0, "value": 1}
        ]}"#,
    )
    .unwrap();
    assert!(LevelManager::new(vec![def]).is_ok());
}

#[test]
fn unknown_turret_direction_is_fatal() {
    let def: LevelDef =
        serde_json::from_str(r#"{"turrets": [{"x": 0, "y": 0, "direction": "diagonal"}]}"#)
            .unwrap();
    assert!(matches!(
        LevelManager::new(vec![def]),
        Err(GameError::UnknownDirection(_))
    ));
}

#[test]
fn collected_hp_filters_only_hp() {
    let def: LevelDef = serde_json::from_str(
        r#"{"powerups": [
            {"type": "hp", "x": 0, "y": 0},
            {"type": "speed", "x": 100, "y": 0, "value": 2}
        ]}"#,
    )
    .unwrap();
    let mut collected = BTreeSet::new();
    collected.insert(3);

    let other = Level::build(2, &def, &collected).unwrap();
    assert_eq!(other.powerups.len(), 2);

    let replay = Level::build(3, &def, &collected).unwrap();
    assert_eq!(replay.powerups.len(), 1);
    assert_eq!(replay.powerups[0].kind, PowerUpKind::Speed);
}

// ── Manager ───────────────────────────────────────────────────────────────────

#[test]
fn manager_bounds() {
    let mgr = LevelManager::new(vec![LevelDef::default(), LevelDef::default()]).unwrap();
    assert_eq!(mgr.count(), 2);
    assert_eq!(mgr.next_index(0), Some(1));
    assert_eq!(mgr.next_index(1), None);
    assert!(mgr.get(1).is_ok());
    assert!(matches!(
        mgr.get(2),
        Err(GameError::LevelOutOfRange { index: 2, count: 2 })
    ));
    assert!(mgr.load(7, &BTreeSet::new()).is_err());
}

#[test]
fn load_is_fresh_every_time() {
    let def: LevelDef = serde_json::from_str(r#"{"ammo": 2, "targets": [{"x": 0, "y": 0}]}"#).unwrap();
    let mgr = LevelManager::new(vec![def]).unwrap();
    let mut first = mgr.load(0, &BTreeSet::new()).unwrap();
    first.targets[0].hit();
    first.ammo = 0;

    let second = mgr.load(0, &BTreeSet::new()).unwrap();
    assert!(!second.targets[0].dead);
    assert_eq!(second.ammo, 2);
}

#[test]
fn load_dir_orders_numerically() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "10.json", r#"{"ammo": 10}"#);
    write(dir.path(), "2.json", r#"{"ammo": 2}"#);
    write(dir.path(), "1.json", r#"{"ammo": 1}"#);
    write(dir.path(), "bonus.json", r#"{"ammo": 99}"#);
    write(dir.path(), "notes.txt", "ignored");

    let mgr = LevelManager::load_dir(dir.path()).unwrap();
    let ammo: Vec<u32> = (0..mgr.count()).map(|i| mgr.get(i).unwrap().ammo).collect();
    assert_eq!(ammo, vec![1, 2, 10, 99]);
}

#[test]
fn load_dir_errors() {
    let empty = tempfile::tempdir().unwrap();
    assert!(matches!(
        LevelManager::load_dir(empty.path()),
        Err(GameError::NoLevels(_))
    ));

    let broken = tempfile::tempdir().unwrap();
    write(broken.path(), "1.json", "{ not json");
    assert!(matches!(
        LevelManager::load_dir(broken.path()),
        Err(GameError::Json { .. })
    ));

    assert!(matches!(
        LevelManager::load_dir(&broken.path().join("missing")),
        Err(GameError::Io { .. })
    ));
}

#[test]
fn bundled_levels_load() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("levels");
    let mgr = LevelManager::load_dir(&dir).unwrap();
    assert!(mgr.count() >= 3);
    assert!(mgr.has_briefing(0));
    for i in 0..mgr.count() {
        let level = mgr.load(i, &BTreeSet::new()).unwrap();
        assert!(!level.targets.is_empty());
    }
}
