#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.
//!
//! Instant-range towers are assigned every enemy inside their range. Single
//! target and projectile towers keep their current lock while the locked
//! enemy is alive and in range, and otherwise acquire the first enemy in
//! population order that is in range. The first match is not necessarily the
//! closest enemy.

use shape_defence_core::{
    EnemyId, EnemySnapshot, EnemyView, Point, TowerSnapshot, TowerStyle, TowerTarget, TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    enemy_workspace: Vec<EnemyCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Assignments are emitted in tower order, and for towers
    /// with several targets in population order.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<TowerTarget>) {
        out.clear();

        if towers.iter().next().is_none() || enemies.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);

        for tower in towers.iter() {
            let range = tower.stats.range;
            let max_distance = range * range;

            if tower.stats.style == TowerStyle::InstantRange {
                out.extend(
                    self.enemy_workspace
                        .iter()
                        .filter(|candidate| candidate.within(tower.position, max_distance))
                        .map(|candidate| TowerTarget {
                            tower: tower.id,
                            enemy: candidate.id,
                        }),
                );
                continue;
            }

            if let Some(enemy) = self.select_single(tower, max_distance) {
                out.push(TowerTarget {
                    tower: tower.id,
                    enemy,
                });
            }
        }
    }

    fn select_single(&self, tower: &TowerSnapshot, max_distance: f32) -> Option<EnemyId> {
        let locked = tower.target.and_then(|enemy| {
            self.enemy_workspace
                .binary_search_by_key(&enemy, |candidate| candidate.id)
                .ok()
                .map(|index| &self.enemy_workspace[index])
        });

        if let Some(candidate) = locked {
            if candidate.within(tower.position, max_distance) {
                return Some(candidate.id);
            }
        }

        self.enemy_workspace
            .iter()
            .find(|candidate| candidate.within(tower.position, max_distance))
            .map(|candidate| candidate.id)
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());
        self.enemy_workspace
            .extend(enemies.iter().map(EnemyCandidate::from));
    }
}

#[derive(Clone, Copy, Debug)]
struct EnemyCandidate {
    id: EnemyId,
    position: Point,
}

impl EnemyCandidate {
    fn within(&self, origin: Point, max_distance: f32) -> bool {
        self.position.distance_squared(origin) <= max_distance
    }
}

impl From<&EnemySnapshot> for EnemyCandidate {
    fn from(snapshot: &EnemySnapshot) -> Self {
        Self {
            id: snapshot.id,
            position: snapshot.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_defence_core::{EnemyKind, TowerId, TowerKind};
    use std::time::Duration;

    fn tower(id: u32, kind: TowerKind, x: f32, y: f32, target: Option<u32>) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            kind,
            position: Point::new(x, y),
            level: 1,
            stats: kind.base_stats(),
            next_fire_at: Duration::ZERO,
            target: target.map(EnemyId::new),
            invested: kind.base_stats().cost,
        }
    }

    fn enemy(id: u32, x: f32, y: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::GRUNT,
            position: Point::new(x, y),
            health: 12.0,
            max_health: 12.0,
            segment: 0,
            boss: false,
            slow_factor: 1.0,
        }
    }

    fn targets_of(towers: Vec<TowerSnapshot>, enemies: Vec<EnemySnapshot>) -> Vec<(u32, u32)> {
        let mut system = TowerTargeting::new();
        let mut out = Vec::new();
        system.handle(
            &TowerView::from_snapshots(towers),
            &EnemyView::from_snapshots(enemies),
            &mut out,
        );
        out.iter()
            .map(|target| (target.tower.get(), target.enemy.get()))
            .collect()
    }

    #[test]
    fn instant_range_tower_targets_everything_in_range() {
        let assignments = targets_of(
            vec![tower(0, TowerKind::Circle, 0.0, 0.0, None)],
            vec![enemy(1, 10.0, 0.0), enemy(2, 500.0, 0.0), enemy(3, 0.0, 130.0)],
        );
        assert_eq!(assignments, vec![(0, 1), (0, 3)]);
    }

    #[test]
    fn single_target_acquires_first_in_population_order() {
        let assignments = targets_of(
            vec![tower(0, TowerKind::Triangle, 0.0, 0.0, None)],
            vec![enemy(4, 80.0, 0.0), enemy(7, 5.0, 0.0)],
        );
        assert_eq!(assignments, vec![(0, 4)]);
    }

    #[test]
    fn lock_is_kept_while_in_range() {
        let assignments = targets_of(
            vec![tower(0, TowerKind::Square, 0.0, 0.0, Some(7))],
            vec![enemy(4, 80.0, 0.0), enemy(7, 150.0, 0.0)],
        );
        assert_eq!(assignments, vec![(0, 7)]);
    }

    #[test]
    fn lock_outside_range_is_replaced() {
        let assignments = targets_of(
            vec![tower(0, TowerKind::Triangle, 0.0, 0.0, Some(7))],
            vec![enemy(4, 80.0, 0.0), enemy(7, 150.0, 0.0)],
        );
        assert_eq!(assignments, vec![(0, 4)]);
    }

    #[test]
    fn no_enemies_produces_no_targets() {
        let assignments = targets_of(vec![tower(0, TowerKind::Circle, 0.0, 0.0, None)], vec![]);
        assert!(assignments.is_empty());
    }
}
