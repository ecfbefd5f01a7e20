#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler responsible for emitting wave and spawn commands.
//!
//! The scheduler never touches the world. It accumulates simulated time from
//! [`Event::TimeAdvanced`], decides when the next wave is due, and reacts to
//! [`Event::WaveStarted`] by queueing that wave's enemies, which it then
//! releases one [`Command::SpawnEnemy`] at a time.

use std::{collections::VecDeque, time::Duration};

use shape_defence_core::{Command, EnemyKind, Event};

/// Decides when the next wave is launched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WavePolicy {
    /// Launch a wave on the first tick and then at a fixed cadence.
    #[default]
    Interval,
    /// Launch a wave once the path is empty and every queued enemy was released.
    OnClear,
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    policy: WavePolicy,
    wave_interval: Duration,
    spawn_spacing: Duration,
    clear_delay: Duration,
    base_count: u32,
    boss_every: u32,
    grunt: EnemyKind,
    boss: EnemyKind,
}

impl Config {
    /// Creates a configuration with the provided policy and wave cadence.
    ///
    /// Remaining parameters start at their defaults: 500 ms between spawns,
    /// five grunts plus one per wave number, and a single boss every fifth wave.
    #[must_use]
    pub const fn new(policy: WavePolicy, wave_interval: Duration) -> Self {
        Self {
            policy,
            wave_interval,
            spawn_spacing: Duration::from_millis(500),
            clear_delay: Duration::from_secs(2),
            base_count: 5,
            boss_every: 5,
            grunt: EnemyKind::GRUNT,
            boss: EnemyKind::BOSS,
        }
    }

    /// Sets the delay between two enemies of the same wave.
    #[must_use]
    pub const fn with_spawn_spacing(mut self, spawn_spacing: Duration) -> Self {
        self.spawn_spacing = spawn_spacing;
        self
    }

    /// Sets how long the path must stay clear before an on-clear wave launches.
    #[must_use]
    pub const fn with_clear_delay(mut self, clear_delay: Duration) -> Self {
        self.clear_delay = clear_delay;
        self
    }

    /// Sets the wave composition: `base_count + wave` grunts, replaced by a
    /// single boss every `boss_every` waves. A `boss_every` of zero disables bosses.
    #[must_use]
    pub const fn with_composition(mut self, base_count: u32, boss_every: u32) -> Self {
        self.base_count = base_count;
        self.boss_every = boss_every;
        self
    }

    /// Sets the templates used for regular enemies and bosses.
    #[must_use]
    pub const fn with_templates(mut self, grunt: EnemyKind, boss: EnemyKind) -> Self {
        self.grunt = grunt;
        self.boss = boss;
        self
    }

    /// Policy deciding when waves launch.
    #[must_use]
    pub const fn policy(&self) -> WavePolicy {
        self.policy
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(WavePolicy::Interval, Duration::from_secs(7))
    }
}

/// Pure system that deterministically schedules waves and releases spawns.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    wave_clock: Duration,
    until_next_wave: Duration,
    clear_clock: Duration,
    requested_waves: u32,
    queue: VecDeque<(EnemyKind, u32)>,
    release_clock: Duration,
    next_release_in: Duration,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            wave_clock: Duration::ZERO,
            until_next_wave: Duration::ZERO,
            clear_clock: Duration::ZERO,
            requested_waves: 0,
            queue: VecDeque::new(),
            release_clock: Duration::ZERO,
            next_release_in: Duration::ZERO,
        }
    }

    /// Asks for a wave to be launched on the next call to [`Spawning::handle`].
    pub fn request_wave(&mut self) {
        self.requested_waves = self.requested_waves.saturating_add(1);
    }

    /// Number of enemies waiting to be released.
    #[must_use]
    pub fn pending_spawns(&self) -> usize {
        self.queue.len()
    }

    /// Consumes events and the live enemy count to emit wave and spawn commands.
    pub fn handle(&mut self, events: &[Event], alive_enemies: usize, out: &mut Vec<Command>) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        let due = self.resolve_due_waves(elapsed, alive_enemies);
        let requested = std::mem::take(&mut self.requested_waves);
        for _ in 0..due.saturating_add(requested) {
            out.push(Command::StartWave);
        }

        self.release(elapsed, out);

        for event in events {
            if let Event::WaveStarted { wave } = event {
                self.enqueue_wave(*wave);
            }
        }
        self.release(Duration::ZERO, out);
    }

    fn resolve_due_waves(&mut self, elapsed: Duration, alive_enemies: usize) -> u32 {
        if elapsed.is_zero() {
            return 0;
        }

        match self.config.policy {
            WavePolicy::Interval => {
                self.wave_clock = self.wave_clock.saturating_add(elapsed);
                if self.config.wave_interval.is_zero() {
                    self.wave_clock = Duration::ZERO;
                    return 1;
                }

                let mut due = 0;
                while self.wave_clock >= self.until_next_wave {
                    self.wave_clock -= self.until_next_wave;
                    self.until_next_wave = self.config.wave_interval;
                    due += 1;
                }
                due
            }
            WavePolicy::OnClear => {
                if alive_enemies > 0 || !self.queue.is_empty() {
                    self.clear_clock = Duration::ZERO;
                    return 0;
                }

                self.clear_clock = self.clear_clock.saturating_add(elapsed);
                if self.clear_clock < self.config.clear_delay {
                    return 0;
                }
                self.clear_clock = Duration::ZERO;
                1
            }
        }
    }

    fn enqueue_wave(&mut self, wave: u32) {
        if self.queue.is_empty() {
            self.release_clock = Duration::ZERO;
            self.next_release_in = Duration::ZERO;
        }

        let boss_wave = self.config.boss_every > 0 && wave % self.config.boss_every == 0;
        if boss_wave {
            self.queue.push_back((self.config.boss, wave));
            return;
        }

        let count = self.config.base_count.saturating_add(wave);
        self.queue
            .extend((0..count).map(|_| (self.config.grunt, wave)));
    }

    fn release(&mut self, elapsed: Duration, out: &mut Vec<Command>) {
        if self.queue.is_empty() {
            return;
        }

        self.release_clock = self.release_clock.saturating_add(elapsed);
        while self.release_clock >= self.next_release_in {
            let Some((kind, wave)) = self.queue.pop_front() else {
                break;
            };
            self.release_clock -= self.next_release_in;
            self.next_release_in = self.config.spawn_spacing;
            out.push(Command::SpawnEnemy { kind, wave });
        }
    }
}
