use std::time::Duration;

use shape_defence_core::{Command, EnemyKind, Event, Point, TowerId, TowerKind};
use shape_defence_system_tower_combat::TowerCombat;
use shape_defence_system_tower_targeting::TowerTargeting;
use shape_defence_world::{self as world, query, World};

fn setup() -> (World, TowerId) {
    let mut world = World::default();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceTower {
            kind: TowerKind::Circle,
            position: Point::new(100.0, 300.0),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::SpawnEnemy {
            kind: EnemyKind::GRUNT,
            wave: 0,
        },
        &mut events,
    );
    let tower = events
        .iter()
        .find_map(|event| match event {
            Event::TowerPlaced { tower, .. } => Some(*tower),
            _ => None,
        })
        .expect("tower placed");
    (world, tower)
}

fn fire_round(
    world: &mut World,
    targeting: &mut TowerTargeting,
    combat: &mut TowerCombat,
) -> Vec<Event> {
    let mut targets = Vec::new();
    targeting.handle(
        &query::tower_view(world),
        &query::enemy_view(world),
        &mut targets,
    );

    let mut commands = Vec::new();
    combat.handle(query::tower_cooldowns(world), &targets, &mut commands);

    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[test]
fn ready_instant_tower_damages_enemy_and_restarts_cooldown() {
    let (mut world, tower) = setup();
    let mut targeting = TowerTargeting::new();
    let mut combat = TowerCombat::new();

    let enemy = *query::enemy_view(&world).iter().next().expect("enemy");
    let tower_position = query::tower_view(&world).get(tower).expect("tower").position;
    assert!((enemy.position.distance(tower_position) - 100.0).abs() < 1e-4);

    let events = fire_round(&mut world, &mut targeting, &mut combat);
    assert!(events.contains(&Event::EnemyDamaged {
        enemy: enemy.id,
        amount: 2.0,
        remaining: 10.0,
    }));

    let health = query::enemy_view(&world).get(enemy.id).expect("alive").health;
    assert!((health - 10.0).abs() < f32::EPSILON);
    let snapshot = *query::tower_view(&world).get(tower).expect("tower");
    assert_eq!(snapshot.next_fire_at, Duration::from_millis(600));

    let events = fire_round(&mut world, &mut targeting, &mut combat);
    assert!(events.is_empty(), "tower still cooling down");
}

#[test]
fn cooldown_restarts_from_the_current_time() {
    let (mut world, tower) = setup();
    let mut targeting = TowerTargeting::new();
    let mut combat = TowerCombat::new();
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut events,
    );
    let events = fire_round(&mut world, &mut targeting, &mut combat);

    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, Event::TowerFired { .. }))
            .count(),
        1
    );
    let snapshot = *query::tower_view(&world).get(tower).expect("tower");
    assert_eq!(snapshot.next_fire_at, Duration::from_millis(1_600));
}

#[test]
fn tower_without_targets_keeps_its_cooldown() {
    let mut world = World::default();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceTower {
            kind: TowerKind::Triangle,
            position: Point::new(300.0, 50.0),
        },
        &mut events,
    );
    let mut targeting = TowerTargeting::new();
    let mut combat = TowerCombat::new();

    let events = fire_round(&mut world, &mut targeting, &mut combat);

    assert!(events.is_empty());
    let cooldowns = query::tower_cooldowns(&world).into_vec();
    assert!(cooldowns[0].ready_in.is_zero());
}
