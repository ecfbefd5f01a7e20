#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Shape Defence session.

mod autoplayer;
mod best_wave;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use shape_defence_core::Event;
use shape_defence_engine::{progression::record_session, EngineConfig, SimulationEngine};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{autoplayer::AutoPlayer, best_wave::JsonFileStore};

/// Command-line arguments accepted by the binary.
#[derive(Debug, Parser)]
#[command(name = "shape-defence", about = "Runs a headless Shape Defence session")]
struct Args {
    /// TOML file overriding the stock board configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed of the auto-player.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Simulated seconds to run before stopping.
    #[arg(long, default_value_t = 300)]
    seconds: u64,
    /// Length of one simulation step in milliseconds.
    #[arg(long, default_value_t = 16)]
    step_ms: u64,
    /// JSON file tracking the best wave across runs.
    #[arg(long)]
    best_wave_file: Option<PathBuf>,
}

/// Tally of the events observed during a session.
#[derive(Debug, Default)]
struct SessionSummary {
    waves: u32,
    kills: u32,
    leaks: u32,
    towers_placed: u32,
    rejected_intents: u32,
}

impl SessionSummary {
    fn observe(&mut self, event: &Event) {
        match event {
            Event::WaveStarted { .. } => self.waves += 1,
            Event::EnemyKilled { .. } => self.kills += 1,
            Event::EnemyLeaked { .. } => self.leaks += 1,
            Event::TowerPlaced { .. } => self.towers_placed += 1,
            Event::IntentRejected { .. } => self.rejected_intents += 1,
            _ => {}
        }
    }
}

/// Entry point for the Shape Defence command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = load_config(args.config.as_deref())?;
    let mut engine = SimulationEngine::new(config).context("invalid engine configuration")?;
    let mut player = AutoPlayer::new(args.seed);
    let mut summary = SessionSummary::default();
    let step = Duration::from_millis(args.step_ms.max(1));
    let budget = Duration::from_secs(args.seconds);

    info!(seed = args.seed, ?step, ?budget, "session started");
    while engine.now() < budget && engine.session_ended().is_none() {
        player.act(&mut engine, step);
        engine.advance(step);
        for event in engine.drain_events() {
            summary.observe(&event);
        }
    }

    let economy = engine.economy();
    let final_wave = engine
        .session_ended()
        .unwrap_or_else(|| economy.wave.saturating_sub(1).max(1));
    info!(
        final_wave,
        money = economy.money,
        base_health = economy.base_health,
        waves = summary.waves,
        kills = summary.kills,
        leaks = summary.leaks,
        towers = summary.towers_placed,
        rejected = summary.rejected_intents,
        "session finished"
    );

    if let Some(path) = args.best_wave_file {
        let mut store = JsonFileStore::new(&path);
        let best = record_session(&mut store, final_wave)
            .with_context(|| format!("failed to record best wave in {}", path.display()))?;
        info!(best = best.wave, new_record = best.new_record, "best wave");
    }

    println!(
        "reached wave {final_wave} with {} kills and {} leaks",
        summary.kills, summary.leaks
    );
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    EngineConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load configuration at {}", path.display()))
}
