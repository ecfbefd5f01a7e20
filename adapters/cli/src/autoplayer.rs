//! Seeded player that places, upgrades and freezes on its own.

use std::time::Duration;

use glam::Vec2;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shape_defence_core::{Point, RejectReason, TowerKind};
use shape_defence_engine::SimulationEngine;
use tracing::debug;

/// Time between two decisions of the auto-player.
const DECISION_INTERVAL: Duration = Duration::from_millis(1_500);
/// Chance of spending money on an upgrade instead of a new tower.
const UPGRADE_CHANCE: f64 = 0.35;
/// Enemies on the path before the auto-player reaches for the freeze ability.
const FREEZE_CROWD: usize = 8;
/// Distance band between the path and a new tower.
const PLACEMENT_OFFSET: std::ops::Range<f32> = 40.0..90.0;
/// Candidate positions tried before settling on the last one.
const PLACEMENT_ATTEMPTS: usize = 4;

/// Deterministic auto-player driven by a ChaCha stream.
#[derive(Debug)]
pub(crate) struct AutoPlayer {
    rng: ChaCha8Rng,
    since_decision: Duration,
}

impl AutoPlayer {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            since_decision: Duration::ZERO,
        }
    }

    /// Lets the player act after `dt` of simulated time.
    pub(crate) fn act(&mut self, engine: &mut SimulationEngine, dt: Duration) {
        if engine.enemies().len() >= FREEZE_CROWD && engine.freeze_ready_in().is_zero() {
            if let Err(reason) = engine.freeze() {
                debug!(%reason, "auto-player freeze rejected");
            }
        }

        self.since_decision = self.since_decision.saturating_add(dt);
        if self.since_decision < DECISION_INTERVAL {
            return;
        }
        self.since_decision = Duration::ZERO;

        if self.rng.gen_bool(UPGRADE_CHANCE) && self.upgrade_cheapest(engine) {
            return;
        }
        self.place_near_path(engine);
    }

    fn upgrade_cheapest(&mut self, engine: &mut SimulationEngine) -> bool {
        let money = engine.economy().money;
        let cheapest = engine
            .towers()
            .iter()
            .filter_map(|tower| Some((engine.upgrade_cost(tower.id)?, tower.id)))
            .filter(|(cost, _)| *cost <= money)
            .min();

        let Some((cost, tower)) = cheapest else {
            return false;
        };

        match engine.upgrade(tower) {
            Ok(()) => {
                debug!(tower = tower.get(), cost, "auto-player upgraded tower");
                true
            }
            Err(reason) => {
                debug!(tower = tower.get(), %reason, "auto-player upgrade rejected");
                false
            }
        }
    }

    fn place_near_path(&mut self, engine: &mut SimulationEngine) {
        let Some(&kind) = TowerKind::ALL.choose(&mut self.rng) else {
            return;
        };

        let mut position = self.candidate_position(engine);
        for _ in 1..PLACEMENT_ATTEMPTS {
            match engine.can_place(kind, position) {
                Ok(()) => break,
                Err(RejectReason::InvalidPlacement) => {
                    position = self.candidate_position(engine);
                }
                Err(reason) => {
                    debug!(?kind, %reason, "auto-player skipped placement");
                    return;
                }
            }
        }

        engine.select_tower_kind(kind);
        match engine.place_selected(position) {
            Ok(tower) => debug!(tower = tower.get(), ?kind, "auto-player placed tower"),
            Err(reason) => debug!(?kind, %reason, "auto-player placement rejected"),
        }
    }

    fn candidate_position(&mut self, engine: &SimulationEngine) -> Point {
        let waypoints = engine.path().waypoints();
        let segment = self.rng.gen_range(0..waypoints.len().saturating_sub(1).max(1));
        let start = to_vec(waypoints[segment]);
        let end = waypoints
            .get(segment + 1)
            .copied()
            .map_or(start, to_vec);

        let along = start.lerp(end, self.rng.gen_range(0.0..1.0));
        let normal = (end - start).normalize_or_zero().perp();
        let side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let offset = self.rng.gen_range(PLACEMENT_OFFSET) * side;
        let position = along + normal * offset;
        Point::new(position.x, position.y)
    }
}

fn to_vec(point: Point) -> Vec2 {
    Vec2::new(point.x(), point.y())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_defence_engine::EngineConfig;

    fn engine() -> SimulationEngine {
        SimulationEngine::new(EngineConfig::default()).expect("default config")
    }

    #[test]
    fn same_seed_plays_the_same_session() {
        let run = |seed| {
            let mut engine = engine();
            let mut player = AutoPlayer::new(seed);
            let step = Duration::from_millis(50);
            for _ in 0..400 {
                player.act(&mut engine, step);
                engine.advance(step);
            }
            engine.drain_events()
        };

        assert_eq!(run(7), run(7));
    }

    #[test]
    fn player_skips_placement_it_cannot_afford() {
        let config = EngineConfig::from_toml_str("[economy]\nstarting_money = 10")
            .expect("config parses");
        let mut engine = SimulationEngine::new(config).expect("valid config");
        let mut player = AutoPlayer::new(3);
        for _ in 0..20 {
            player.place_near_path(&mut engine);
        }

        assert_eq!(engine.towers().iter().count(), 0);
        assert!(!engine
            .drain_events()
            .iter()
            .any(|event| matches!(event, shape_defence_core::Event::IntentRejected { .. })));
    }

    #[test]
    fn candidates_keep_their_distance_from_waypoints() {
        let engine = engine();
        let mut player = AutoPlayer::new(11);
        let waypoints = engine.path().waypoints();
        for _ in 0..50 {
            let position = to_vec(player.candidate_position(&engine));
            let nearest = waypoints
                .iter()
                .map(|waypoint| position.distance(to_vec(*waypoint)))
                .fold(f32::INFINITY, f32::min);
            assert!(nearest >= PLACEMENT_OFFSET.start - 1e-3);
        }
    }
}
