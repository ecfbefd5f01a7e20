//! Enemy population walking the path.

use std::{ops::ControlFlow, time::Duration};

use glam::Vec2;
use shape_defence_core::{EnemyId, EnemyKind, EnemySnapshot, Point};

use crate::{path::Path, to_point, to_vec};

/// Movement milestones reported while advancing the population.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum EnemyStep {
    /// The enemy snapped onto a waypoint and turned onto the next segment.
    ReachedWaypoint { enemy: EnemyId, waypoint: usize },
    /// The enemy walked past the final waypoint and left the population.
    Leaked { enemy: EnemyId, boss: bool },
}

/// Result of applying damage to a live enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum DamageOutcome {
    Damaged { remaining: f32 },
    Killed { boss: bool },
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Slow {
    factor: f32,
    remaining: Duration,
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    position: Vec2,
    health: f32,
    max_health: f32,
    segment: usize,
    slow: Option<Slow>,
}

impl Enemy {
    fn slow_factor(&self) -> f32 {
        self.slow.map_or(1.0, |slow| slow.factor)
    }

    fn decay_slow(&mut self, dt: Duration) {
        if let Some(slow) = &mut self.slow {
            slow.remaining = slow.remaining.saturating_sub(dt);
            if slow.remaining.is_zero() {
                self.slow = None;
            }
        }
    }

    /// Moves toward the next waypoint, snapping onto it when the step would
    /// reach or pass it. Returns the index of the waypoint snapped onto.
    fn walk(&mut self, path: &Path, dt: Duration) -> Option<usize> {
        let next_index = self.segment + 1;
        let next = to_vec(path.waypoint(next_index)?);
        let step = self.kind.speed() * self.slow_factor() * dt.as_secs_f32();
        let offset = next - self.position;
        let distance = offset.length();

        if distance >= step && distance > 0.0 {
            self.position += offset / distance * step;
            return None;
        }

        self.position = next;
        self.segment = next_index;
        Some(next_index)
    }

    fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: to_point(self.position),
            health: self.health,
            max_health: self.max_health,
            segment: self.segment,
            boss: self.kind.is_boss(),
            slow_factor: self.slow_factor(),
        }
    }
}

/// Owns every live enemy in spawn order.
#[derive(Debug)]
pub(crate) struct EnemyPopulation {
    enemies: Vec<Enemy>,
    next_enemy_id: EnemyId,
}

impl EnemyPopulation {
    pub(crate) fn new() -> Self {
        Self {
            enemies: Vec::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    /// Creates an enemy at `start` with the provided scaled health.
    pub(crate) fn spawn(&mut self, kind: EnemyKind, health: f32, start: Point) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().wrapping_add(1));
        self.enemies.push(Enemy {
            id,
            kind,
            position: to_vec(start),
            health,
            max_health: health,
            segment: 0,
            slow: None,
        });
        id
    }

    /// Walks every enemy in spawn order, reporting milestones to `report`.
    ///
    /// Leaked enemies are removed before they are reported. Returning
    /// [`ControlFlow::Break`] from `report` stops processing the remaining
    /// enemies, which stay where they are.
    pub(crate) fn advance<F>(&mut self, path: &Path, dt: Duration, mut report: F)
    where
        F: FnMut(EnemyStep) -> ControlFlow<()>,
    {
        let last_segment = path.segment_count();
        let mut index = 0;

        while index < self.enemies.len() {
            let enemy = &mut self.enemies[index];
            let reached = enemy.walk(path, dt);
            enemy.decay_slow(dt);
            let id = enemy.id;

            let Some(waypoint) = reached else {
                index += 1;
                continue;
            };

            if report(EnemyStep::ReachedWaypoint { enemy: id, waypoint }).is_break() {
                return;
            }

            if waypoint < last_segment {
                index += 1;
                continue;
            }

            let leaked = self.enemies.remove(index);
            let step = EnemyStep::Leaked {
                enemy: leaked.id,
                boss: leaked.kind.is_boss(),
            };
            if report(step).is_break() {
                return;
            }
        }
    }

    /// Applies damage to a live enemy, removing it when health drops to zero.
    ///
    /// Returns `None` when the enemy is no longer part of the population.
    pub(crate) fn apply_damage(&mut self, id: EnemyId, amount: f32) -> Option<DamageOutcome> {
        let index = self.index_of(id)?;
        let enemy = &mut self.enemies[index];
        enemy.health -= amount;

        if enemy.health > 0.0 {
            return Some(DamageOutcome::Damaged {
                remaining: enemy.health,
            });
        }

        let killed = self.enemies.remove(index);
        Some(DamageOutcome::Killed {
            boss: killed.kind.is_boss(),
        })
    }

    /// Slows every live enemy, replacing any slow already in effect.
    pub(crate) fn slow_all(&mut self, factor: f32, duration: Duration) -> usize {
        for enemy in &mut self.enemies {
            enemy.slow = Some(Slow {
                factor,
                remaining: duration,
            });
        }
        self.enemies.len()
    }

    pub(crate) fn position(&self, id: EnemyId) -> Option<Point> {
        self.index_of(id)
            .map(|index| to_point(self.enemies[index].position))
    }

    pub(crate) fn contains(&self, id: EnemyId) -> bool {
        self.index_of(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.enemies.len()
    }

    pub(crate) fn snapshots(&self) -> Vec<EnemySnapshot> {
        self.enemies.iter().map(Enemy::snapshot).collect()
    }

    // Identifiers grow monotonically and removal preserves order, so the
    // population stays sorted by id.
    fn index_of(&self, id: EnemyId) -> Option<usize> {
        self.enemies
            .binary_search_by_key(&id, |enemy| enemy.id)
            .ok()
    }
}
