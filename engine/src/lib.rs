#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session driver that wires the Shape Defence world to its systems.
//!
//! A [`SimulationEngine`] owns one world together with the wave scheduler and
//! the tower systems. Each call to [`SimulationEngine::advance`] runs the
//! phases of a simulation step in a fixed order: the clock tick and enemy
//! movement, wave scheduling, tower targeting and firing, and finally
//! projectile resolution. Every event produced along the way is buffered until
//! the caller drains it.

mod config;
pub mod progression;

use std::time::Duration;

use shape_defence_core::{
    Command, EconomySnapshot, EnemyView, Event, Point, ProjectileView, RejectReason,
    TowerId, TowerKind, TowerTarget, TowerView,
};
use shape_defence_system_spawning::Spawning;
use shape_defence_system_tower_combat::TowerCombat;
use shape_defence_system_tower_targeting::TowerTargeting;
use shape_defence_world::{self as world, query, Path, World};
use tracing::{info, trace};

pub use config::{
    ConfigError, EconomyConfig, EngineConfig, EnemyTemplateConfig, FreezeConfig, PathConfig,
    PolicyConfig, ProjectileConfig, TowerConfig, WaveConfig,
};

/// Deterministic single-session simulation engine.
#[derive(Debug)]
pub struct SimulationEngine {
    world: World,
    spawning: Spawning,
    targeting: TowerTargeting,
    combat: TowerCombat,
    selected: TowerKind,
    targets: Vec<TowerTarget>,
    log: Vec<Event>,
}

impl SimulationEngine {
    /// Creates an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let path = config.path()?;
        let spawning = config.spawning()?;
        let rules = config.rules()?;
        info!(
            waypoints = path.waypoints().len(),
            policy = ?spawning.policy(),
            starting_money = rules.starting_money,
            "simulation engine created"
        );

        Ok(Self {
            world: World::new(path, rules),
            spawning: Spawning::new(spawning),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            selected: TowerKind::Circle,
            targets: Vec::new(),
            log: Vec::new(),
        })
    }

    /// Advances the simulation by `dt`.
    ///
    /// Does nothing once the session has ended. When the base falls during a
    /// step the remaining phases of that step are skipped.
    pub fn advance(&mut self, dt: Duration) {
        if self.session_ended().is_some() {
            trace!(?dt, "session over, advance ignored");
            return;
        }

        let events = self.execute(Command::Tick { dt });
        if self.session_ended().is_some() {
            return;
        }

        self.pump_spawning(events);
        self.fire_towers();
        let _ = self.execute(Command::AdvanceProjectiles { dt });
    }

    /// Places a tower of `kind` centred on `position`.
    pub fn place(&mut self, kind: TowerKind, position: Point) -> Result<TowerId, RejectReason> {
        let events = self.execute(Command::PlaceTower { kind, position });
        outcome(&events, |event| match event {
            Event::TowerPlaced { tower, .. } => Some(*tower),
            _ => None,
        })
    }

    /// Places a tower of the currently selected kind.
    pub fn place_selected(&mut self, position: Point) -> Result<TowerId, RejectReason> {
        self.place(self.selected, position)
    }

    /// Chooses the kind used by [`SimulationEngine::place_selected`].
    pub fn select_tower_kind(&mut self, kind: TowerKind) {
        self.selected = kind;
    }

    /// Kind used by [`SimulationEngine::place_selected`].
    #[must_use]
    pub fn selected_tower_kind(&self) -> TowerKind {
        self.selected
    }

    /// Upgrades `tower` by one level.
    pub fn upgrade(&mut self, tower: TowerId) -> Result<(), RejectReason> {
        let events = self.execute(Command::UpgradeTower { tower });
        outcome(&events, |event| match event {
            Event::TowerUpgraded { .. } => Some(()),
            _ => None,
        })
    }

    /// Sells `tower`, returning the refunded money.
    pub fn sell(&mut self, tower: TowerId) -> Result<u32, RejectReason> {
        let events = self.execute(Command::SellTower { tower });
        outcome(&events, |event| match event {
            Event::TowerSold { refund, .. } => Some(*refund),
            _ => None,
        })
    }

    /// Slows every enemy on the path.
    pub fn freeze(&mut self) -> Result<(), RejectReason> {
        let events = self.execute(Command::Freeze);
        outcome(&events, |event| match event {
            Event::EnemiesFrozen { .. } => Some(()),
            _ => None,
        })
    }

    /// Launches the next wave immediately, independent of the wave policy.
    pub fn spawn_wave(&mut self) {
        if self.session_ended().is_some() {
            return;
        }
        self.spawning.request_wave();
        self.pump_spawning(Vec::new());
    }

    /// Checks whether a tower of `kind` could be placed at `position`.
    pub fn can_place(&self, kind: TowerKind, position: Point) -> Result<(), RejectReason> {
        query::validate_placement(&self.world, kind, position)
    }

    /// Price of the next upgrade of `tower`, if it can be upgraded.
    #[must_use]
    pub fn upgrade_cost(&self, tower: TowerId) -> Option<u32> {
        query::upgrade_cost(&self.world, tower)
    }

    /// Enemies currently on the path.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Placed towers.
    #[must_use]
    pub fn towers(&self) -> TowerView {
        query::tower_view(&self.world)
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> ProjectileView {
        query::projectile_view(&self.world)
    }

    /// Money, base health and wave counter.
    #[must_use]
    pub fn economy(&self) -> EconomySnapshot {
        query::economy(&self.world)
    }

    /// Path enemies walk.
    #[must_use]
    pub fn path(&self) -> &Path {
        query::path(&self.world)
    }

    /// Simulated time elapsed since the session started.
    #[must_use]
    pub fn now(&self) -> Duration {
        query::clock(&self.world)
    }

    /// Time left before the freeze ability is ready.
    #[must_use]
    pub fn freeze_ready_in(&self) -> Duration {
        query::freeze_ready_in(&self.world)
    }

    /// Final wave once the base has been destroyed.
    #[must_use]
    pub fn session_ended(&self) -> Option<u32> {
        query::session_ended(&self.world)
    }

    /// Takes every event produced since the previous drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.log)
    }

    fn execute(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.log.extend(events.iter().cloned());
        events
    }

    fn pump_spawning(&mut self, mut events: Vec<Event>) {
        loop {
            let mut commands = Vec::new();
            let alive = query::enemy_count(&self.world);
            self.spawning.handle(&events, alive, &mut commands);
            if commands.is_empty() {
                break;
            }

            events.clear();
            for command in commands {
                events.extend(self.execute(command));
            }
        }
    }

    fn fire_towers(&mut self) {
        let towers = query::tower_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.targeting.handle(&towers, &enemies, &mut self.targets);

        let mut commands = Vec::new();
        self.combat.handle(
            query::tower_cooldowns(&self.world),
            &self.targets,
            &mut commands,
        );
        for command in commands {
            let _ = self.execute(command);
        }
    }
}

fn outcome<T, F>(events: &[Event], accepted: F) -> Result<T, RejectReason>
where
    F: Fn(&Event) -> Option<T>,
{
    for event in events {
        if let Event::IntentRejected { reason, .. } = event {
            return Err(*reason);
        }
        if let Some(value) = accepted(event) {
            return Ok(value);
        }
    }

    // The world answers every intent with an acceptance or a rejection; an
    // empty answer only happens after the session ended.
    Err(RejectReason::SessionOver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_tick_leaves_spawn_queue_untouched() {
        let config = EngineConfig::from_toml_str(
            r#"
                [economy]
                base_health = 1

                [waves]
                base_count = 500
                spawn_spacing_ms = 50

                [path]
                waypoints = [[0.0, 300.0], [40.0, 300.0]]
            "#,
        )
        .expect("config parses");
        let mut engine = SimulationEngine::new(config).expect("valid config");

        for _ in 0..100 {
            let pending = engine.spawning.pending_spawns();
            engine.advance(Duration::from_millis(100));
            if engine.session_ended().is_some() {
                assert!(pending > 0);
                assert_eq!(engine.spawning.pending_spawns(), pending);
                break;
            }
        }

        assert_eq!(engine.session_ended(), Some(1));
        let events = engine.drain_events();
        assert_eq!(events.last(), Some(&Event::SessionEnded { final_wave: 1 }));
    }
}
