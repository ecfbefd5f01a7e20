//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use shape_defence_core::{
    EnemyId, Point, TowerCooldownSnapshot, TowerId, TowerKind, TowerSnapshot, TowerStats,
};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Centre of the tower.
    pub(crate) position: Point,
    /// Upgrade level, starting at one.
    pub(crate) level: u32,
    /// Simulation time at which the tower may fire again.
    pub(crate) next_fire_at: Duration,
    /// Enemy the tower is locked onto.
    pub(crate) target: Option<EnemyId>,
    /// Money spent on the tower so far.
    pub(crate) invested: u32,
}

impl TowerState {
    pub(crate) fn stats(&self) -> TowerStats {
        self.kind.stats_at(self.level)
    }

    fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            level: self.level,
            stats: self.stats(),
            next_fire_at: self.next_fire_at,
            target: self.target,
            invested: self.invested,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a freshly placed tower that is ready to fire immediately.
    pub(crate) fn insert(&mut self, kind: TowerKind, position: Point, cost: u32) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().wrapping_add(1));
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                kind,
                position,
                level: 1,
                next_fire_at: Duration::ZERO,
                target: None,
                invested: cost,
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    /// Reports whether any tower lies strictly within `clearance` of `position`.
    pub(crate) fn crowds(&self, position: Point, clearance: f32) -> bool {
        let limit = clearance * clearance;
        self.entries
            .values()
            .any(|tower| tower.position.distance_squared(position) < limit)
    }

    /// Drops every lock held on `enemy`.
    pub(crate) fn release_target(&mut self, enemy: EnemyId) {
        for tower in self.entries.values_mut() {
            if tower.target == Some(enemy) {
                tower.target = None;
            }
        }
    }

    pub(crate) fn snapshots(&self) -> Vec<TowerSnapshot> {
        self.entries.values().map(TowerState::snapshot).collect()
    }

    pub(crate) fn cooldowns(&self, now: Duration) -> Vec<TowerCooldownSnapshot> {
        self.entries
            .values()
            .map(|tower| TowerCooldownSnapshot {
                tower: tower.id,
                ready_in: tower.next_fire_at.saturating_sub(now),
            })
            .collect()
    }
}

/// Money required to lift a tower from `level` to the next level.
pub(crate) fn upgrade_cost(level: u32, base: u32, step: u32) -> u32 {
    base.saturating_add(level.saturating_mul(step))
}

/// Money returned when selling a tower that absorbed `invested`.
pub(crate) fn refund_for(invested: u32, percent: u32) -> u32 {
    let refund = u64::from(invested) * u64::from(percent.min(100)) / 100;
    u32::try_from(refund).unwrap_or(invested)
}
