#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Shape Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Callers submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to deterministically. Systems consume event
//! streams, query immutable snapshots, and respond exclusively with new
//! command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Advances the simulation clock and walks every enemy along the path.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Launches the next wave, incrementing the wave counter.
    StartWave,
    /// Requests that an enemy enter the path at its first waypoint.
    SpawnEnemy {
        /// Template describing the enemy's base statistics.
        kind: EnemyKind,
        /// Wave the enemy belongs to; drives health scaling.
        wave: u32,
    },
    /// Requests placement of a tower at the provided position.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Centre of the tower in world units.
        position: Point,
    },
    /// Requests an in-place upgrade of an existing tower.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests removal of an existing tower in exchange for a partial refund.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Requests that a ready tower discharge at the provided targets.
    FireTower {
        /// Identifier of the tower that fires.
        tower: TowerId,
        /// Enemies selected by targeting, in population order.
        targets: Vec<EnemyId>,
    },
    /// Moves every in-flight projectile and resolves hits.
    AdvanceProjectiles {
        /// Duration of simulated time the projectiles travel for.
        dt: Duration,
    },
    /// Slows every enemy currently on the path.
    Freeze,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new wave was launched.
    WaveStarted {
        /// Number of the wave that started, beginning at one.
        wave: u32,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Template the enemy was created from.
        kind: EnemyKind,
        /// Position the enemy occupies after spawning.
        position: Point,
        /// Health the enemy starts with after wave scaling.
        health: f32,
    },
    /// Reports that an enemy arrived at a waypoint and turned onto the next segment.
    EnemyReachedWaypoint {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Index of the waypoint that was reached.
        waypoint: usize,
    },
    /// Reports that an enemy took damage and survived.
    EnemyDamaged {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Damage applied.
        amount: f32,
        /// Health left after the damage.
        remaining: f32,
    },
    /// Reports that an enemy was destroyed by tower fire.
    EnemyKilled {
        /// Identifier of the destroyed enemy.
        enemy: EnemyId,
        /// Money credited for the kill.
        bounty: u32,
        /// Whether the destroyed enemy was a boss.
        boss: bool,
    },
    /// Reports that an enemy reached the end of the path.
    EnemyLeaked {
        /// Identifier of the enemy that leaked.
        enemy: EnemyId,
        /// Base health lost to the leak.
        damage: u32,
        /// Whether the leaking enemy was a boss.
        boss: bool,
    },
    /// Confirms that the freeze ability slowed the enemies on the path.
    EnemiesFrozen {
        /// Number of enemies affected.
        affected: usize,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Centre of the tower.
        position: Point,
        /// Money deducted for the placement.
        cost: u32,
    },
    /// Confirms that a tower advanced to a new level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level reached after the upgrade.
        level: u32,
        /// Money deducted for the upgrade.
        cost: u32,
    },
    /// Confirms that a tower was sold and removed.
    TowerSold {
        /// Identifier of the removed tower.
        tower: TowerId,
        /// Money refunded to the player.
        refund: u32,
    },
    /// Reports that a tower discharged at a target.
    TowerFired {
        /// Identifier of the tower that fired.
        tower: TowerId,
        /// Enemy the shot was aimed at.
        target: EnemyId,
    },
    /// Reports that a projectile left its tower.
    ProjectileLaunched {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Tower that launched the projectile.
        tower: TowerId,
        /// Enemy the projectile homes in on.
        target: EnemyId,
    },
    /// Reports that a projectile struck its target and was consumed.
    ProjectileHit {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Enemy that absorbed the damage.
        target: EnemyId,
    },
    /// Reports that a projectile lost its target and vanished without damage.
    ProjectileDiscarded {
        /// Identifier of the projectile.
        projectile: ProjectileId,
    },
    /// Reports that a player intent was refused.
    IntentRejected {
        /// Intent that was refused.
        intent: Intent,
        /// Specific reason the intent failed.
        reason: RejectReason,
    },
    /// Announces that the base was destroyed. No further ticks are processed.
    SessionEnded {
        /// Highest wave launched during the session.
        final_wave: u32,
    },
}

/// Player intents that the world may refuse.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Tower placement request.
    Place {
        /// Requested tower type.
        kind: TowerKind,
        /// Requested tower centre.
        position: Point,
    },
    /// Tower upgrade request.
    Upgrade {
        /// Tower targeted by the request.
        tower: TowerId,
    },
    /// Tower sale request.
    Sell {
        /// Tower targeted by the request.
        tower: TowerId,
    },
    /// Freeze ability request.
    Freeze,
}

/// Reasons a player intent may be refused by the world.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// The player cannot afford the requested action.
    #[error("insufficient funds")]
    InsufficientFunds,
    /// The position overlaps the path or another tower.
    #[error("position overlaps the path or another tower")]
    InvalidPlacement,
    /// No tower with the provided identifier exists.
    #[error("unknown tower id")]
    UnknownTowerId,
    /// The tower cap has been reached.
    #[error("maximum number of towers reached")]
    MaxTowersReached,
    /// The tower is already at its highest level.
    #[error("tower is already at its maximum level")]
    MaxLevelReached,
    /// The requested ability is still recharging.
    #[error("ability is on cooldown")]
    AbilityOnCooldown,
    /// The base was destroyed and the session no longer accepts intents.
    #[error("session has ended")]
    SessionOver,
}

/// Continuous position in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point from its coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Squared euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Unique identifier assigned to an enemy. Identifiers are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Reasons an enemy template may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum TemplateError {
    /// Health must be strictly positive.
    #[error("enemy health must be positive, got {0}")]
    NonPositiveHealth(f32),
    /// Speed must be strictly positive.
    #[error("enemy speed must be positive, got {0}")]
    NonPositiveSpeed(f32),
}

/// Static template describing an enemy type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyKind {
    health: f32,
    speed: f32,
    radius: f32,
    boss: bool,
}

impl EnemyKind {
    /// Standard wave enemy.
    pub const GRUNT: Self = Self {
        health: 12.0,
        speed: 48.0,
        radius: 14.0,
        boss: false,
    };

    /// Single heavy enemy that replaces a boss wave.
    pub const BOSS: Self = Self {
        health: 150.0,
        speed: 30.0,
        radius: 24.0,
        boss: true,
    };

    /// Creates a custom template, validating health and speed.
    pub fn new(health: f32, speed: f32, radius: f32, boss: bool) -> Result<Self, TemplateError> {
        if health.is_nan() || health <= 0.0 {
            return Err(TemplateError::NonPositiveHealth(health));
        }
        if speed.is_nan() || speed <= 0.0 {
            return Err(TemplateError::NonPositiveSpeed(speed));
        }

        Ok(Self {
            health,
            speed,
            radius,
            boss,
        })
    }

    /// Health before wave scaling.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Visual radius. Not simulated.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Whether enemies of this kind count as bosses.
    #[must_use]
    pub const fn is_boss(&self) -> bool {
        self.boss
    }
}

/// Damage delivery behaviour of a tower kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TowerStyle {
    /// Damages every enemy in range on each fire tick.
    InstantRange,
    /// Locks onto a single enemy and damages it instantly.
    SingleTarget,
    /// Launches a homing projectile at a single locked enemy.
    Projectile {
        /// Projectile travel speed in world units per second.
        speed: f32,
    },
}

/// Combat statistics of a tower at a given level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Damage applied per hit.
    pub damage: f32,
    /// Minimum time between two shots.
    pub fire_interval: Duration,
    /// Targeting radius in world units.
    pub range: f32,
    /// Placement cost.
    pub cost: u32,
    /// Damage delivery behaviour.
    pub style: TowerStyle,
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Pulse tower that hits everything in range.
    Circle,
    /// Long-range cannon that fires homing shells.
    Square,
    /// Short-range rapid beam locked on one enemy.
    Triangle,
}

impl TowerKind {
    /// Every constructible tower kind in selection order.
    pub const ALL: [TowerKind; 3] = [Self::Circle, Self::Square, Self::Triangle];

    /// Returns the statistics of a freshly placed tower.
    #[must_use]
    pub const fn base_stats(self) -> TowerStats {
        match self {
            Self::Circle => TowerStats {
                damage: 2.0,
                fire_interval: Duration::from_millis(600),
                range: 130.0,
                cost: 40,
                style: TowerStyle::InstantRange,
            },
            Self::Square => TowerStats {
                damage: 5.0,
                fire_interval: Duration::from_millis(1400),
                range: 170.0,
                cost: 70,
                style: TowerStyle::Projectile { speed: 420.0 },
            },
            Self::Triangle => TowerStats {
                damage: 3.0,
                fire_interval: Duration::from_millis(300),
                range: 90.0,
                cost: 50,
                style: TowerStyle::SingleTarget,
            },
        }
    }

    /// Returns the statistics of a tower upgraded to `level`.
    ///
    /// Level one yields [`TowerKind::base_stats`]. Each further level adds half
    /// of the base damage, a tenth of the base range, and shortens the fire
    /// interval by fifteen percent. A level of zero is treated as level one.
    #[must_use]
    pub fn stats_at(self, level: u32) -> TowerStats {
        let base = self.base_stats();
        let steps = level.saturating_sub(1);
        if steps == 0 {
            return base;
        }

        let scale = steps as f32;
        TowerStats {
            damage: base.damage * (1.0 + 0.5 * scale),
            fire_interval: shorten_interval(base.fire_interval, steps),
            range: base.range * (1.0 + 0.1 * scale),
            ..base
        }
    }
}

/// Applies `steps` reductions of fifteen percent in whole nanoseconds.
fn shorten_interval(interval: Duration, steps: u32) -> Duration {
    let mut nanos = interval.as_nanos();
    for _ in 0..steps {
        if nanos == 0 {
            break;
        }
        nanos = nanos * 17 / 20;
    }
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier assigned to the enemy.
    pub id: EnemyId,
    /// Template the enemy was created from.
    pub kind: EnemyKind,
    /// Current position.
    pub position: Point,
    /// Remaining health.
    pub health: f32,
    /// Health at spawn.
    pub max_health: f32,
    /// Index of the path segment the enemy walks.
    pub segment: usize,
    /// Whether the enemy is a boss.
    pub boss: bool,
    /// Movement multiplier applied by slow effects; one when unaffected.
    pub slow_factor: f32,
}

/// Read-only snapshot describing all enemies in population order.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a specific enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemies were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Centre of the tower.
    pub position: Point,
    /// Current upgrade level, starting at one.
    pub level: u32,
    /// Statistics at the current level.
    pub stats: TowerStats,
    /// Simulation time at which the tower may fire again.
    pub next_fire_at: Duration,
    /// Enemy the tower is locked onto, if any.
    pub target: Option<EnemyId>,
    /// Money spent on placement and upgrades.
    pub invested: u32,
}

/// Read-only snapshot describing all towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a specific tower.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }
}

/// Remaining cooldown of a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Identifier of the tower.
    pub tower: TowerId,
    /// Time left before the tower may fire; zero when ready.
    pub ready_in: Duration,
}

/// Read-only snapshot describing tower cooldowns.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Iterator over the captured cooldowns in tower order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Assignment of an enemy to a tower computed by targeting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower that should fire.
    pub tower: TowerId,
    /// Enemy the tower should fire at.
    pub enemy: EnemyId,
}

/// Immutable representation of a single projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier of the projectile.
    pub id: ProjectileId,
    /// Current position.
    pub position: Point,
    /// Enemy the projectile homes in on.
    pub target: EnemyId,
}

/// Read-only snapshot describing every projectile in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured projectiles in launch order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no projectiles are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable economy state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    /// Money available to spend.
    pub money: u32,
    /// Remaining base health; the session ends at zero or below.
    pub base_health: i32,
    /// Number of the next wave to launch.
    pub wave: u32,
}
