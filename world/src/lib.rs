#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Shape Defence.
//!
//! The [`World`] owns the path, the enemy population, the towers, the
//! projectiles in flight and the economy. It is only ever mutated through
//! [`apply`], which executes a single [`Command`] and reports what happened as
//! [`Event`] values. Read access goes through the [`query`] module.

mod economy;
mod enemies;
mod path;
mod projectiles;
mod rules;
mod towers;

use std::{ops::ControlFlow, time::Duration};

use glam::Vec2;
use shape_defence_core::{
    Command, EnemyId, EnemyKind, Event, Intent, Point, RejectReason, TowerId, TowerKind,
    TowerStyle,
};
use tracing::{debug, info, warn};

pub use path::{Path, PathError};
pub use rules::Rules;

use economy::Economy;
use enemies::{DamageOutcome, EnemyPopulation, EnemyStep};
use projectiles::{Flight, ProjectileSwarm};
use towers::{refund_for, upgrade_cost, TowerRegistry};

/// Represents the authoritative Shape Defence world state.
#[derive(Debug)]
pub struct World {
    path: Path,
    rules: Rules,
    clock: Duration,
    enemies: EnemyPopulation,
    towers: TowerRegistry,
    projectiles: ProjectileSwarm,
    economy: Economy,
    freeze_ready_at: Duration,
    final_wave: Option<u32>,
}

impl World {
    /// Creates a world on the provided path governed by `rules`.
    #[must_use]
    pub fn new(path: Path, rules: Rules) -> Self {
        let economy = Economy::new(rules.starting_money, rules.base_health);
        Self {
            path,
            rules,
            clock: Duration::ZERO,
            enemies: EnemyPopulation::new(),
            towers: TowerRegistry::new(),
            projectiles: ProjectileSwarm::new(),
            economy,
            freeze_ready_at: Duration::ZERO,
            final_wave: None,
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        let Self {
            path,
            rules,
            enemies,
            towers,
            economy,
            final_wave,
            ..
        } = self;

        enemies.advance(path, dt, |step| match step {
            EnemyStep::ReachedWaypoint { enemy, waypoint } => {
                out_events.push(Event::EnemyReachedWaypoint { enemy, waypoint });
                ControlFlow::Continue(())
            }
            EnemyStep::Leaked { enemy, boss } => {
                let damage = rules.leak_damage(boss);
                let destroyed = economy.damage_base(damage);
                towers.release_target(enemy);
                debug!(enemy = enemy.get(), damage, boss, "enemy leaked");
                out_events.push(Event::EnemyLeaked {
                    enemy,
                    damage,
                    boss,
                });

                if !destroyed {
                    return ControlFlow::Continue(());
                }

                let wave = economy.final_wave();
                *final_wave = Some(wave);
                info!(final_wave = wave, "base destroyed");
                out_events.push(Event::SessionEnded { final_wave: wave });
                ControlFlow::Break(())
            }
        });

        if self.final_wave.is_none() {
            self.release_distant_locks();
        }
    }

    fn release_distant_locks(&mut self) {
        let Self {
            enemies, towers, ..
        } = self;

        for tower in towers.iter_mut() {
            let Some(target) = tower.target else {
                continue;
            };

            let range = tower.stats().range;
            let in_range = enemies
                .position(target)
                .is_some_and(|position| position.distance_squared(tower.position) <= range * range);
            if !in_range {
                tower.target = None;
            }
        }
    }

    fn start_wave(&mut self, out_events: &mut Vec<Event>) {
        let wave = self.economy.start_wave();
        info!(wave, "wave started");
        out_events.push(Event::WaveStarted { wave });
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, wave: u32, out_events: &mut Vec<Event>) {
        let health = kind.health() + self.rules.health_per_wave * wave as f32;
        let position = self.path.start();
        let enemy = self.enemies.spawn(kind, health, position);
        debug!(enemy = enemy.get(), wave, health, boss = kind.is_boss(), "enemy spawned");
        out_events.push(Event::EnemySpawned {
            enemy,
            kind,
            position,
            health,
        });
    }

    fn place_tower(&mut self, kind: TowerKind, position: Point) -> Result<(TowerId, u32), RejectReason> {
        query::validate_placement(self, kind, position)?;
        let cost = kind.base_stats().cost;
        self.economy.spend(cost)?;
        Ok((self.towers.insert(kind, position, cost), cost))
    }

    fn upgrade_tower(&mut self, tower: TowerId) -> Result<(u32, u32), RejectReason> {
        let state = self
            .towers
            .get_mut(tower)
            .ok_or(RejectReason::UnknownTowerId)?;
        if state.level >= self.rules.max_level {
            return Err(RejectReason::MaxLevelReached);
        }

        let cost = upgrade_cost(
            state.level,
            self.rules.upgrade_base_cost,
            self.rules.upgrade_cost_step,
        );
        self.economy.spend(cost)?;
        state.level += 1;
        state.invested = state.invested.saturating_add(cost);
        Ok((state.level, cost))
    }

    fn sell_tower(&mut self, tower: TowerId) -> Result<u32, RejectReason> {
        let state = self
            .towers
            .remove(tower)
            .ok_or(RejectReason::UnknownTowerId)?;
        let refund = refund_for(state.invested, self.rules.refund_percent);
        self.economy.credit(refund);
        Ok(refund)
    }

    fn freeze(&mut self) -> Result<usize, RejectReason> {
        if self.clock < self.freeze_ready_at {
            return Err(RejectReason::AbilityOnCooldown);
        }

        let affected = self
            .enemies
            .slow_all(self.rules.freeze_factor, self.rules.freeze_duration);
        self.freeze_ready_at = self.clock.saturating_add(self.rules.freeze_cooldown);
        Ok(affected)
    }

    fn fire_tower(&mut self, tower_id: TowerId, targets: Vec<EnemyId>, out_events: &mut Vec<Event>) {
        let now = self.clock;
        let Some(tower) = self.towers.get(tower_id) else {
            debug!(tower = tower_id.get(), "fire request for unknown tower");
            return;
        };
        if now < tower.next_fire_at {
            return;
        }

        let stats = tower.stats();
        let origin = tower.position;
        let live: Vec<EnemyId> = targets
            .into_iter()
            .filter(|enemy| self.enemies.contains(*enemy))
            .collect();
        let Some(&primary) = live.first() else {
            return;
        };

        if let Some(tower) = self.towers.get_mut(tower_id) {
            tower.next_fire_at = now.saturating_add(stats.fire_interval);
            if stats.style != TowerStyle::InstantRange {
                tower.target = Some(primary);
            }
        }

        match stats.style {
            TowerStyle::InstantRange => {
                for enemy in live {
                    out_events.push(Event::TowerFired {
                        tower: tower_id,
                        target: enemy,
                    });
                    self.damage_enemy(enemy, stats.damage, out_events);
                }
            }
            TowerStyle::SingleTarget => {
                out_events.push(Event::TowerFired {
                    tower: tower_id,
                    target: primary,
                });
                self.damage_enemy(primary, stats.damage, out_events);
            }
            TowerStyle::Projectile { speed } => {
                out_events.push(Event::TowerFired {
                    tower: tower_id,
                    target: primary,
                });
                let projectile = self
                    .projectiles
                    .launch(origin, primary, stats.damage, speed);
                out_events.push(Event::ProjectileLaunched {
                    projectile,
                    tower: tower_id,
                    target: primary,
                });
            }
        }
    }

    // Projectiles resolve one at a time so a target killed by an earlier
    // projectile is already gone when the next one checks for it.
    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let hit_radius = self.rules.projectile_hit_radius;
        let in_flight = self.projectiles.take_active();
        let mut survivors = Vec::with_capacity(in_flight.len());

        for mut projectile in in_flight {
            let target = self.enemies.position(projectile.target);
            match projectile.advance(target, dt, hit_radius) {
                Flight::Travelling => survivors.push(projectile),
                Flight::Lost => out_events.push(Event::ProjectileDiscarded {
                    projectile: projectile.id,
                }),
                Flight::Impact => {
                    out_events.push(Event::ProjectileHit {
                        projectile: projectile.id,
                        target: projectile.target,
                    });
                    self.damage_enemy(projectile.target, projectile.damage, out_events);
                }
            }
        }

        self.projectiles.restore(survivors);
    }

    fn damage_enemy(&mut self, enemy: EnemyId, amount: f32, out_events: &mut Vec<Event>) {
        match self.enemies.apply_damage(enemy, amount) {
            None => {}
            Some(DamageOutcome::Damaged { remaining }) => {
                out_events.push(Event::EnemyDamaged {
                    enemy,
                    amount,
                    remaining,
                });
            }
            Some(DamageOutcome::Killed { boss }) => {
                let bounty = self.rules.bounty(boss);
                self.economy.credit(bounty);
                self.towers.release_target(enemy);
                debug!(enemy = enemy.get(), bounty, boss, "enemy killed");
                out_events.push(Event::EnemyKilled {
                    enemy,
                    bounty,
                    boss,
                });
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Path::default(), Rules::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the base has been destroyed every simulation command is ignored and
/// every player intent is rejected with [`RejectReason::SessionOver`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.final_wave.is_some() {
        match intent_of(&command) {
            Some(intent) => reject(intent, RejectReason::SessionOver, out_events),
            None => warn!(?command, "ignoring command after the session ended"),
        }
        return;
    }

    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::StartWave => world.start_wave(out_events),
        Command::SpawnEnemy { kind, wave } => world.spawn_enemy(kind, wave, out_events),
        Command::PlaceTower { kind, position } => match world.place_tower(kind, position) {
            Ok((tower, cost)) => {
                debug!(tower = tower.get(), ?kind, cost, "tower placed");
                out_events.push(Event::TowerPlaced {
                    tower,
                    kind,
                    position,
                    cost,
                });
            }
            Err(reason) => reject(Intent::Place { kind, position }, reason, out_events),
        },
        Command::UpgradeTower { tower } => match world.upgrade_tower(tower) {
            Ok((level, cost)) => out_events.push(Event::TowerUpgraded { tower, level, cost }),
            Err(reason) => reject(Intent::Upgrade { tower }, reason, out_events),
        },
        Command::SellTower { tower } => match world.sell_tower(tower) {
            Ok(refund) => out_events.push(Event::TowerSold { tower, refund }),
            Err(reason) => reject(Intent::Sell { tower }, reason, out_events),
        },
        Command::FireTower { tower, targets } => world.fire_tower(tower, targets, out_events),
        Command::AdvanceProjectiles { dt } => world.advance_projectiles(dt, out_events),
        Command::Freeze => match world.freeze() {
            Ok(affected) => out_events.push(Event::EnemiesFrozen { affected }),
            Err(reason) => reject(Intent::Freeze, reason, out_events),
        },
    }
}

fn intent_of(command: &Command) -> Option<Intent> {
    match *command {
        Command::PlaceTower { kind, position } => Some(Intent::Place { kind, position }),
        Command::UpgradeTower { tower } => Some(Intent::Upgrade { tower }),
        Command::SellTower { tower } => Some(Intent::Sell { tower }),
        Command::Freeze => Some(Intent::Freeze),
        _ => None,
    }
}

fn reject(intent: Intent, reason: RejectReason, out_events: &mut Vec<Event>) {
    debug!(?intent, %reason, "intent rejected");
    out_events.push(Event::IntentRejected { intent, reason });
}

pub(crate) fn to_vec(point: Point) -> Vec2 {
    Vec2::new(point.x(), point.y())
}

pub(crate) fn to_point(vector: Vec2) -> Point {
    Point::new(vector.x, vector.y)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{towers, Path, World};
    use shape_defence_core::{
        EconomySnapshot, EnemyView, Point, ProjectileView, RejectReason, TowerCooldownView,
        TowerId, TowerKind, TowerView,
    };

    /// Provides read-only access to the path enemies walk.
    #[must_use]
    pub fn path(world: &World) -> &Path {
        &world.path
    }

    /// Total simulated time elapsed.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Captures a read-only view of the enemies on the path.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.snapshots())
    }

    /// Number of enemies currently on the path.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.snapshots())
    }

    /// Captures the remaining cooldown of every tower.
    #[must_use]
    pub fn tower_cooldowns(world: &World) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(world.towers.cooldowns(world.clock))
    }

    /// Captures a read-only view of the projectiles in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(world.projectiles.snapshots())
    }

    /// Captures money, base health and the wave counter.
    #[must_use]
    pub fn economy(world: &World) -> EconomySnapshot {
        world.economy.snapshot()
    }

    /// Final wave reached when the base has been destroyed.
    #[must_use]
    pub fn session_ended(world: &World) -> Option<u32> {
        world.final_wave
    }

    /// Price of the next upgrade of `tower`, or `None` for unknown or maxed towers.
    #[must_use]
    pub fn upgrade_cost(world: &World, tower: TowerId) -> Option<u32> {
        let state = world.towers.get(tower)?;
        if state.level >= world.rules.max_level {
            return None;
        }
        Some(towers::upgrade_cost(
            state.level,
            world.rules.upgrade_base_cost,
            world.rules.upgrade_cost_step,
        ))
    }

    /// Time left before the freeze ability may be used again.
    #[must_use]
    pub fn freeze_ready_in(world: &World) -> Duration {
        world.freeze_ready_at.saturating_sub(world.clock)
    }

    /// Checks whether a tower of `kind` could be placed at `position` right now.
    ///
    /// Checks run in a fixed order: session state, tower cap, funds, then
    /// clearance from every path waypoint and every existing tower.
    pub fn validate_placement(
        world: &World,
        kind: TowerKind,
        position: Point,
    ) -> Result<(), RejectReason> {
        if world.final_wave.is_some() {
            return Err(RejectReason::SessionOver);
        }
        if world.towers.len() >= world.rules.max_towers {
            return Err(RejectReason::MaxTowersReached);
        }
        if !world.economy.can_afford(kind.base_stats().cost) {
            return Err(RejectReason::InsufficientFunds);
        }

        let clearance = world.rules.clearance;
        let limit = clearance * clearance;
        let near_path = world
            .path
            .waypoints()
            .iter()
            .any(|waypoint| waypoint.distance_squared(position) < limit);
        if near_path || world.towers.crowds(position, clearance) {
            return Err(RejectReason::InvalidPlacement);
        }

        Ok(())
    }
}
