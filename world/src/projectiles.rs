//! Homing projectiles launched by projectile-style towers.

use std::time::Duration;

use glam::Vec2;
use shape_defence_core::{EnemyId, Point, ProjectileId, ProjectileSnapshot};

use crate::{to_point, to_vec};

/// Outcome of moving a projectile for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Flight {
    /// Still closing in on the target.
    Travelling,
    /// Reached the target; damage must be applied once.
    Impact,
    /// The target is gone; the projectile vanishes without damage.
    Lost,
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) target: EnemyId,
    pub(crate) damage: f32,
    position: Vec2,
    speed: f32,
    last_distance: Option<f32>,
}

impl Projectile {
    /// Homes toward `target` for `dt`.
    ///
    /// The distance to the target is remembered between ticks: a projectile
    /// that ends a tick farther away than the previous one has passed its
    /// target and counts as an impact.
    pub(crate) fn advance(&mut self, target: Option<Point>, dt: Duration, hit_radius: f32) -> Flight {
        let Some(target) = target else {
            return Flight::Lost;
        };

        let target = to_vec(target);
        let offset = target - self.position;
        let distance = offset.length();
        let step = self.speed * dt.as_secs_f32();

        if distance <= hit_radius || step >= distance {
            self.position = target;
            return Flight::Impact;
        }

        self.position += offset / distance * step;
        let remaining = distance - step;
        if remaining <= hit_radius {
            return Flight::Impact;
        }

        if let Some(last) = self.last_distance {
            if remaining > last {
                return Flight::Impact;
            }
        }

        self.last_distance = Some(remaining);
        Flight::Travelling
    }

    fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            position: to_point(self.position),
            target: self.target,
        }
    }
}

/// Every projectile in flight, in launch order.
#[derive(Debug)]
pub(crate) struct ProjectileSwarm {
    active: Vec<Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileSwarm {
    pub(crate) fn new() -> Self {
        Self {
            active: Vec::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    pub(crate) fn launch(
        &mut self,
        origin: Point,
        target: EnemyId,
        damage: f32,
        speed: f32,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().wrapping_add(1));
        self.active.push(Projectile {
            id,
            target,
            damage,
            position: to_vec(origin),
            speed,
            last_distance: None,
        });
        id
    }

    /// Removes every projectile so the caller can resolve them one by one.
    pub(crate) fn take_active(&mut self) -> Vec<Projectile> {
        std::mem::take(&mut self.active)
    }

    /// Returns surviving projectiles after resolution.
    pub(crate) fn restore(&mut self, survivors: Vec<Projectile>) {
        debug_assert!(self.active.is_empty(), "restore expects a drained swarm");
        self.active = survivors;
    }

    pub(crate) fn snapshots(&self) -> Vec<ProjectileSnapshot> {
        self.active.iter().map(Projectile::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swarm_with_projectile(speed: f32) -> (ProjectileSwarm, Projectile) {
        let mut swarm = ProjectileSwarm::new();
        let _ = swarm.launch(Point::new(0.0, 0.0), EnemyId::new(3), 5.0, speed);
        let mut taken = swarm.take_active();
        let projectile = taken.pop().expect("projectile launched");
        (swarm, projectile)
    }

    #[test]
    fn lost_target_discards_projectile() {
        let (_, mut projectile) = swarm_with_projectile(100.0);
        assert_eq!(
            projectile.advance(None, Duration::from_millis(16), 8.0),
            Flight::Lost
        );
    }

    #[test]
    fn projectile_travels_toward_target() {
        let (_, mut projectile) = swarm_with_projectile(100.0);
        let flight = projectile.advance(
            Some(Point::new(100.0, 0.0)),
            Duration::from_millis(100),
            8.0,
        );

        assert_eq!(flight, Flight::Travelling);
        assert!((projectile.snapshot().position.x() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn reaching_step_counts_as_impact() {
        let (_, mut projectile) = swarm_with_projectile(100.0);
        let flight = projectile.advance(Some(Point::new(20.0, 0.0)), Duration::from_secs(1), 1.0);
        assert_eq!(flight, Flight::Impact);
    }

    #[test]
    fn growing_distance_counts_as_impact() {
        let (_, mut projectile) = swarm_with_projectile(10.0);
        let dt = Duration::from_secs(1);

        assert_eq!(
            projectile.advance(Some(Point::new(50.0, 0.0)), dt, 1.0),
            Flight::Travelling
        );
        // The target outran the projectile, ending the tick farther away.
        assert_eq!(
            projectile.advance(Some(Point::new(80.0, 0.0)), dt, 1.0),
            Flight::Impact
        );
    }

    #[test]
    fn restore_keeps_survivors_visible() {
        let (mut swarm, projectile) = swarm_with_projectile(10.0);
        assert!(swarm.snapshots().is_empty());
        swarm.restore(vec![projectile]);
        assert_eq!(swarm.snapshots().len(), 1);
    }
}
