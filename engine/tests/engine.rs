use std::{collections::BTreeSet, time::Duration};

use shape_defence_core::{Event, Point, RejectReason, TowerKind};
use shape_defence_engine::{ConfigError, EngineConfig, SimulationEngine};

const FRAME: Duration = Duration::from_millis(16);

fn engine() -> SimulationEngine {
    SimulationEngine::new(EngineConfig::default()).expect("default config is valid")
}

fn engine_from(toml: &str) -> SimulationEngine {
    let config = EngineConfig::from_toml_str(toml).expect("config parses");
    SimulationEngine::new(config).expect("config is valid")
}

fn count(events: &[Event], matcher: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| matcher(event)).count()
}

#[test]
fn first_advance_launches_first_wave() {
    let mut engine = engine();
    engine.advance(FRAME);
    let events = engine.drain_events();

    assert!(events.contains(&Event::WaveStarted { wave: 1 }));
    assert_eq!(
        count(&events, |event| matches!(event, Event::EnemySpawned { .. })),
        1
    );
    assert_eq!(engine.economy().wave, 2);
    assert_eq!(engine.now(), FRAME);
}

#[test]
fn wave_spawns_are_released_over_time() {
    let mut engine = engine();
    engine.advance(FRAME);
    engine.advance(Duration::from_millis(500));
    engine.advance(Duration::from_millis(500));

    let events = engine.drain_events();
    assert_eq!(
        count(&events, |event| matches!(event, Event::EnemySpawned { .. })),
        3
    );
    assert_eq!(engine.enemies().len(), 3);
}

#[test]
fn spawn_wave_launches_without_advancing_time() {
    let mut engine = engine_from("[waves]\npolicy = \"on_clear\"");
    engine.spawn_wave();
    let events = engine.drain_events();

    assert_eq!(events[0], Event::WaveStarted { wave: 1 });
    assert!(matches!(events[1], Event::EnemySpawned { .. }));
    assert_eq!(engine.now(), Duration::ZERO);
    assert_eq!(engine.enemies().len(), 1);
}

#[test]
fn towers_kill_enemies_and_earn_bounties() {
    let mut engine = engine();
    let _ = engine
        .place(TowerKind::Circle, Point::new(60.0, 250.0))
        .expect("circle placed");
    let _ = engine
        .place(TowerKind::Triangle, Point::new(60.0, 350.0))
        .expect("triangle placed");
    assert_eq!(engine.economy().money, 60);

    for _ in 0..625 {
        engine.advance(FRAME);
    }

    let events = engine.drain_events();
    let kills = count(&events, |event| matches!(event, Event::EnemyKilled { .. }));
    assert!(kills >= 1, "expected at least one kill");
    let bounty = u32::try_from(kills).expect("small count") * 15;
    assert_eq!(engine.economy().money, 60 + bounty);
}

#[test]
fn selected_kind_is_used_for_placement() {
    let mut engine = engine();
    engine.select_tower_kind(TowerKind::Square);
    let tower = engine
        .place_selected(Point::new(300.0, 80.0))
        .expect("square placed");

    assert_eq!(engine.selected_tower_kind(), TowerKind::Square);
    assert_eq!(
        engine.towers().get(tower).expect("tower").kind,
        TowerKind::Square
    );
    assert_eq!(engine.economy().money, 80);
}

#[test]
fn intents_report_rejections() {
    let mut engine = engine();
    let tower = engine
        .place(TowerKind::Circle, Point::new(50.0, 50.0))
        .expect("placed");

    assert_eq!(
        engine.place(TowerKind::Circle, Point::new(55.0, 55.0)),
        Err(RejectReason::InvalidPlacement)
    );
    assert_eq!(engine.upgrade(tower), Ok(()));
    assert_eq!(engine.upgrade_cost(tower), Some(70));
    assert_eq!(engine.sell(tower), Ok(45));
    assert_eq!(engine.sell(tower), Err(RejectReason::UnknownTowerId));
    assert_eq!(engine.economy().money, 105);
}

#[test]
fn freeze_recharges_after_cooldown() {
    let mut engine = engine();
    assert_eq!(engine.freeze(), Ok(()));
    assert_eq!(engine.freeze(), Err(RejectReason::AbilityOnCooldown));

    engine.advance(Duration::from_secs(20));
    assert!(engine.freeze_ready_in().is_zero());
    assert_eq!(engine.freeze(), Ok(()));
}

#[test]
fn destroyed_base_stops_the_session() {
    let mut engine = engine_from(
        r#"
            [economy]
            base_health = 1

            [path]
            waypoints = [[0.0, 300.0], [40.0, 300.0]]
        "#,
    );

    for _ in 0..200 {
        engine.advance(Duration::from_millis(100));
        if engine.session_ended().is_some() {
            break;
        }
    }

    assert_eq!(engine.session_ended(), Some(1));
    let events = engine.drain_events();
    assert_eq!(
        count(&events, |event| matches!(event, Event::SessionEnded { .. })),
        1
    );
    assert_eq!(events.last(), Some(&Event::SessionEnded { final_wave: 1 }));

    let clock = engine.now();
    engine.advance(Duration::from_secs(5));
    engine.spawn_wave();
    assert!(engine.drain_events().is_empty());
    assert_eq!(engine.now(), clock);
    assert_eq!(
        engine.place(TowerKind::Circle, Point::new(200.0, 100.0)),
        Err(RejectReason::SessionOver)
    );
}

#[test]
fn deterministic_replay_produces_identical_event_streams() {
    let first = replay();
    let second = replay();

    assert_eq!(first, second, "replay diverged between runs");
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::ProjectileLaunched { .. })));
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::EnemiesFrozen { .. })));
}

fn replay() -> Vec<Event> {
    let mut engine = engine();
    let cannon = engine
        .place(TowerKind::Square, Point::new(150.0, 360.0))
        .expect("cannon placed");
    let _ = engine
        .place(TowerKind::Triangle, Point::new(260.0, 200.0))
        .expect("beam placed");

    for step in 0..1_500 {
        engine.advance(FRAME);
        match step {
            300 => {
                let _ = engine.freeze();
            }
            600 => {
                let _ = engine.upgrade(cannon);
            }
            900 => engine.spawn_wave(),
            _ => {}
        }
    }

    engine.drain_events()
}

#[test]
fn out_of_range_rules_are_rejected_at_construction() {
    for (toml, expected) in [
        ("[freeze]\nfactor = -2.0", "freeze.factor"),
        ("[projectiles]\nhit_radius = -1.0", "projectiles.hit_radius"),
        ("[towers]\nclearance = nan", "towers.clearance"),
    ] {
        let config = EngineConfig::from_toml_str(toml).expect("config parses");
        match SimulationEngine::new(config) {
            Err(ConfigError::InvalidRule { field }) => assert_eq!(field, expected),
            other => panic!("expected {expected} to be rejected, got {other:?}"),
        }
    }
}

#[test]
fn every_projectile_resolves_exactly_once() {
    let mut engine = engine_from("[economy]\nstarting_money = 400");
    for (x, y) in [
        (150.0, 360.0),
        (300.0, 330.0),
        (500.0, 330.0),
        (650.0, 360.0),
    ] {
        let _ = engine
            .place(TowerKind::Square, Point::new(x, y))
            .expect("cannon placed");
    }

    let mut launched = BTreeSet::new();
    let mut resolved = BTreeSet::new();
    for _ in 0..3_000 {
        engine.advance(FRAME);
        for event in engine.drain_events() {
            match event {
                Event::ProjectileLaunched { projectile, .. } => {
                    assert!(launched.insert(projectile), "launched twice");
                }
                Event::ProjectileHit { projectile, .. }
                | Event::ProjectileDiscarded { projectile } => {
                    assert!(launched.contains(&projectile), "resolved before launch");
                    assert!(resolved.insert(projectile), "resolved twice");
                }
                _ => {}
            }
        }
        if engine.session_ended().is_some() {
            break;
        }
    }

    let in_flight: BTreeSet<_> = engine.projectiles().iter().map(|shot| shot.id).collect();
    assert!(!launched.is_empty());
    assert!(resolved.is_disjoint(&in_flight));
    assert_eq!(launched.len(), resolved.len() + in_flight.len());
}
