//! TOML-backed configuration of a simulation session.
//!
//! Every section and field is optional; missing values fall back to the
//! constants of the stock Shape Defence board.

use std::time::Duration;

use serde::Deserialize;
use shape_defence_core::{EnemyKind, Point, TemplateError};
use shape_defence_system_spawning::{Config as SpawningConfig, WavePolicy};
use shape_defence_world::{Path, PathError, Rules};
use thiserror::Error;

/// Errors raised while loading or validating an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse engine configuration")]
    Parse(#[from] toml::de::Error),
    /// The configured waypoints do not form a valid path.
    #[error("invalid path")]
    Path(#[from] PathError),
    /// An enemy template carries non-positive statistics.
    #[error("invalid `{name}` enemy template")]
    Template {
        /// Name of the offending template section.
        name: &'static str,
        /// Validation failure reported by the template.
        #[source]
        source: TemplateError,
    },
    /// A numeric rule lies outside its valid range.
    #[error("`{field}` is out of range")]
    InvalidRule {
        /// Dotted name of the offending field.
        field: &'static str,
    },
}

/// Complete configuration of a simulation engine.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Money, base health, bounties and leak damage.
    pub economy: EconomyConfig,
    /// Wave cadence, composition and enemy templates.
    pub waves: WaveConfig,
    /// Placement, upgrade and refund rules.
    pub towers: TowerConfig,
    /// Projectile resolution parameters.
    pub projectiles: ProjectileConfig,
    /// Freeze ability parameters.
    pub freeze: FreezeConfig,
    /// Waypoints enemies walk.
    pub path: PathConfig,
}

impl EngineConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Builds the validated world rules described by the configuration.
    ///
    /// The freeze factor must lie in `(0, 1]`; clearance, hit radius and
    /// health scaling must be finite and non-negative.
    pub fn rules(&self) -> Result<Rules, ConfigError> {
        let factor = self.freeze.factor;
        if factor.is_nan() || factor <= 0.0 || factor > 1.0 {
            return Err(ConfigError::InvalidRule {
                field: "freeze.factor",
            });
        }
        non_negative("towers.clearance", self.towers.clearance)?;
        non_negative("projectiles.hit_radius", self.projectiles.hit_radius)?;
        non_negative("waves.health_per_wave", self.waves.health_per_wave)?;

        Ok(Rules {
            starting_money: self.economy.starting_money,
            base_health: self.economy.base_health,
            kill_bounty: self.economy.kill_bounty,
            boss_kill_bounty: self.economy.boss_kill_bounty,
            leak_damage: self.economy.leak_damage,
            boss_leak_damage: self.economy.boss_leak_damage,
            health_per_wave: self.waves.health_per_wave,
            clearance: self.towers.clearance,
            max_towers: self.towers.max_towers,
            max_level: self.towers.max_level,
            upgrade_base_cost: self.towers.upgrade_base_cost,
            upgrade_cost_step: self.towers.upgrade_cost_step,
            refund_percent: self.towers.refund_percent,
            projectile_hit_radius: self.projectiles.hit_radius,
            freeze_factor: self.freeze.factor,
            freeze_duration: Duration::from_millis(self.freeze.duration_ms),
            freeze_cooldown: Duration::from_millis(self.freeze.cooldown_ms),
        })
    }

    /// Builds the validated path described by the configuration.
    pub fn path(&self) -> Result<Path, ConfigError> {
        let waypoints = self
            .path
            .waypoints
            .iter()
            .map(|[x, y]| Point::new(*x, *y))
            .collect();
        Ok(Path::new(waypoints)?)
    }

    /// Builds the wave scheduler configuration.
    pub fn spawning(&self) -> Result<SpawningConfig, ConfigError> {
        let waves = &self.waves;
        let grunt = waves.grunt.to_kind("grunt", false)?;
        let boss = waves.boss.to_kind("boss", true)?;
        let policy = match waves.policy {
            PolicyConfig::Interval => WavePolicy::Interval,
            PolicyConfig::OnClear => WavePolicy::OnClear,
        };

        Ok(
            SpawningConfig::new(policy, Duration::from_millis(waves.interval_ms))
                .with_spawn_spacing(Duration::from_millis(waves.spawn_spacing_ms))
                .with_clear_delay(Duration::from_millis(waves.clear_delay_ms))
                .with_composition(waves.base_count, waves.boss_every)
                .with_templates(grunt, boss),
        )
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRule { field })
    }
}

/// Economy section of the configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EconomyConfig {
    /// Money available at session start.
    pub starting_money: u32,
    /// Base health at session start.
    pub base_health: i32,
    /// Bounty for a regular kill.
    pub kill_bounty: u32,
    /// Bounty for a boss kill.
    pub boss_kill_bounty: u32,
    /// Base damage of a regular leak.
    pub leak_damage: u32,
    /// Base damage of a boss leak.
    pub boss_leak_damage: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        let rules = Rules::default();
        Self {
            starting_money: rules.starting_money,
            base_health: rules.base_health,
            kill_bounty: rules.kill_bounty,
            boss_kill_bounty: rules.boss_kill_bounty,
            leak_damage: rules.leak_damage,
            boss_leak_damage: rules.boss_leak_damage,
        }
    }
}

/// Wave launch policy as spelled in configuration files.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Waves launch at a fixed cadence.
    #[default]
    Interval,
    /// Waves launch once the path is clear.
    OnClear,
}

/// Wave section of the configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WaveConfig {
    /// When waves launch.
    pub policy: PolicyConfig,
    /// Cadence of the interval policy in milliseconds.
    pub interval_ms: u64,
    /// Delay between two spawns of one wave in milliseconds.
    pub spawn_spacing_ms: u64,
    /// Time the path must stay clear under the on-clear policy, in milliseconds.
    pub clear_delay_ms: u64,
    /// Grunts per wave before adding the wave number.
    pub base_count: u32,
    /// Every n-th wave is a single boss; zero disables bosses.
    pub boss_every: u32,
    /// Health added per wave number.
    pub health_per_wave: f32,
    /// Template of regular enemies.
    pub grunt: EnemyTemplateConfig,
    /// Template of bosses.
    pub boss: EnemyTemplateConfig,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::Interval,
            interval_ms: 7_000,
            spawn_spacing_ms: 500,
            clear_delay_ms: 2_000,
            base_count: 5,
            boss_every: 5,
            health_per_wave: Rules::default().health_per_wave,
            grunt: EnemyTemplateConfig::from(EnemyKind::GRUNT),
            boss: EnemyTemplateConfig::from(EnemyKind::BOSS),
        }
    }
}

/// Base statistics of an enemy template.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnemyTemplateConfig {
    /// Health before wave scaling.
    pub health: f32,
    /// Speed in world units per second.
    pub speed: f32,
    /// Visual radius.
    pub radius: f32,
}

impl EnemyTemplateConfig {
    fn to_kind(self, name: &'static str, boss: bool) -> Result<EnemyKind, ConfigError> {
        EnemyKind::new(self.health, self.speed, self.radius, boss)
            .map_err(|source| ConfigError::Template { name, source })
    }
}

impl From<EnemyKind> for EnemyTemplateConfig {
    fn from(kind: EnemyKind) -> Self {
        Self {
            health: kind.health(),
            speed: kind.speed(),
            radius: kind.radius(),
        }
    }
}

/// Tower section of the configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TowerConfig {
    /// Minimum distance to waypoints and other towers.
    pub clearance: f32,
    /// Tower cap.
    pub max_towers: usize,
    /// Highest upgrade level; one disables upgrades.
    pub max_level: u32,
    /// Upgrade price independent of level.
    pub upgrade_base_cost: u32,
    /// Upgrade price per current level.
    pub upgrade_cost_step: u32,
    /// Refund share on sale, in percent.
    pub refund_percent: u32,
}

impl Default for TowerConfig {
    fn default() -> Self {
        let rules = Rules::default();
        Self {
            clearance: rules.clearance,
            max_towers: rules.max_towers,
            max_level: rules.max_level,
            upgrade_base_cost: rules.upgrade_base_cost,
            upgrade_cost_step: rules.upgrade_cost_step,
            refund_percent: rules.refund_percent,
        }
    }
}

/// Projectile section of the configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectileConfig {
    /// Distance at which a projectile strikes its target.
    pub hit_radius: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            hit_radius: Rules::default().projectile_hit_radius,
        }
    }
}

/// Freeze section of the configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FreezeConfig {
    /// Movement multiplier while frozen.
    pub factor: f32,
    /// Slow duration in milliseconds.
    pub duration_ms: u64,
    /// Cooldown in milliseconds.
    pub cooldown_ms: u64,
}

impl Default for FreezeConfig {
    fn default() -> Self {
        Self {
            factor: 0.5,
            duration_ms: 3_000,
            cooldown_ms: 20_000,
        }
    }
}

/// Path section of the configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PathConfig {
    /// Waypoints as `[x, y]` pairs.
    pub waypoints: Vec<[f32; 2]>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            waypoints: Path::default()
                .waypoints()
                .iter()
                .map(|point| [point.x(), point.y()])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_stock_rules() {
        let config = EngineConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.rules().expect("stock rules"), Rules::default());
        assert_eq!(config.path().expect("valid path"), Path::default());
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = EngineConfig::from_toml_str(
            r#"
                [economy]
                starting_money = 500

                [waves]
                policy = "on_clear"
                boss_every = 0

                [path]
                waypoints = [[0.0, 0.0], [100.0, 0.0]]
            "#,
        )
        .expect("config parses");

        assert_eq!(config.economy.starting_money, 500);
        assert_eq!(config.economy.base_health, 20);
        assert_eq!(config.waves.policy, PolicyConfig::OnClear);
        assert_eq!(config.path().expect("valid path").segment_count(), 1);
        assert_eq!(
            config.spawning().expect("valid waves").policy(),
            WavePolicy::OnClear
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = EngineConfig::from_toml_str("[economy]\nmoney = 3").expect_err("typo");
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn degenerate_path_is_rejected() {
        let config = EngineConfig::from_toml_str("[path]\nwaypoints = [[1.0, 1.0]]")
            .expect("config parses");
        assert!(matches!(config.path(), Err(ConfigError::Path(_))));
    }

    #[test]
    fn invalid_template_is_rejected() {
        let config = EngineConfig::from_toml_str(
            "[waves.grunt]\nhealth = 0.0\nspeed = 48.0\nradius = 14.0",
        )
        .expect("config parses");
        assert!(matches!(
            config.spawning(),
            Err(ConfigError::Template { name: "grunt", .. })
        ));
    }

    fn rule_error(toml: &str) -> Option<&'static str> {
        let config = EngineConfig::from_toml_str(toml).expect("config parses");
        match config.rules() {
            Err(ConfigError::InvalidRule { field }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn freeze_factor_must_slow_without_reversing() {
        assert_eq!(rule_error("[freeze]\nfactor = -2.0"), Some("freeze.factor"));
        assert_eq!(rule_error("[freeze]\nfactor = 0.0"), Some("freeze.factor"));
        assert_eq!(rule_error("[freeze]\nfactor = 1.5"), Some("freeze.factor"));
        assert_eq!(rule_error("[freeze]\nfactor = nan"), Some("freeze.factor"));
        assert_eq!(rule_error("[freeze]\nfactor = 1.0"), None);
    }

    #[test]
    fn hit_radius_must_be_non_negative() {
        assert_eq!(
            rule_error("[projectiles]\nhit_radius = -1.0"),
            Some("projectiles.hit_radius")
        );
        assert_eq!(
            rule_error("[projectiles]\nhit_radius = nan"),
            Some("projectiles.hit_radius")
        );
        assert_eq!(rule_error("[projectiles]\nhit_radius = 0.0"), None);
    }

    #[test]
    fn clearance_must_be_non_negative() {
        assert_eq!(
            rule_error("[towers]\nclearance = -5.0"),
            Some("towers.clearance")
        );
        assert_eq!(
            rule_error("[towers]\nclearance = nan"),
            Some("towers.clearance")
        );
    }

    #[test]
    fn health_scaling_must_be_non_negative() {
        assert_eq!(
            rule_error("[waves]\nhealth_per_wave = -3.0"),
            Some("waves.health_per_wave")
        );
    }
}
