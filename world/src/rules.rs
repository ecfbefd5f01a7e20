//! Tunable constants consulted by the world while applying commands.

use std::time::Duration;

/// Economy, placement and combat rules of a session.
///
/// The defaults reproduce the stock Shape Defence board.
#[derive(Clone, Debug, PartialEq)]
pub struct Rules {
    /// Money available when the session starts.
    pub starting_money: u32,
    /// Base health when the session starts.
    pub base_health: i32,
    /// Money credited for killing a regular enemy.
    pub kill_bounty: u32,
    /// Money credited for killing a boss.
    pub boss_kill_bounty: u32,
    /// Base health lost when a regular enemy leaks.
    pub leak_damage: u32,
    /// Base health lost when a boss leaks.
    pub boss_leak_damage: u32,
    /// Health added to every enemy per wave number.
    pub health_per_wave: f32,
    /// Minimum distance between a new tower and any waypoint or tower.
    pub clearance: f32,
    /// Maximum number of towers on the board.
    pub max_towers: usize,
    /// Highest level a tower can be upgraded to.
    pub max_level: u32,
    /// Upgrade price independent of level.
    pub upgrade_base_cost: u32,
    /// Upgrade price added per current level.
    pub upgrade_cost_step: u32,
    /// Share of the money invested in a tower refunded on sale, in percent.
    pub refund_percent: u32,
    /// Distance at which a projectile counts as having struck its target.
    pub projectile_hit_radius: f32,
    /// Movement multiplier applied by the freeze ability.
    pub freeze_factor: f32,
    /// How long the freeze slow lasts.
    pub freeze_duration: Duration,
    /// Time before the freeze ability may be used again.
    pub freeze_cooldown: Duration,
}

impl Rules {
    pub(crate) fn bounty(&self, boss: bool) -> u32 {
        if boss {
            self.boss_kill_bounty
        } else {
            self.kill_bounty
        }
    }

    pub(crate) fn leak_damage(&self, boss: bool) -> u32 {
        if boss {
            self.boss_leak_damage
        } else {
            self.leak_damage
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            starting_money: 150,
            base_health: 20,
            kill_bounty: 15,
            boss_kill_bounty: 75,
            leak_damage: 1,
            boss_leak_damage: 5,
            health_per_wave: 3.0,
            clearance: 30.0,
            max_towers: 25,
            max_level: 5,
            upgrade_base_cost: 30,
            upgrade_cost_step: 20,
            refund_percent: 50,
            projectile_hit_radius: 8.0,
            freeze_factor: 0.5,
            freeze_duration: Duration::from_secs(3),
            freeze_cooldown: Duration::from_secs(20),
        }
    }
}
