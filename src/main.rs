//! # Tactica Headless Driver
//!
//! Generates a seeded overworld and lets the auto commander play it at a fixed
//! tick rate until the first battle is decided.

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tactica::{
    config::TARGET_FPS, AutoCommander, DeltaTime, EngineConfig, GameEvent, GameMode, GameState,
    GameStatistics, TacticaResult, Team,
};
#[cfg(feature = "dev-tools")]
use tracing::Level;

/// Command line arguments for the headless driver.
#[derive(Parser, Debug)]
#[command(name = "tactica")]
#[command(about = "Runs a seeded skirmish with scripted commanders")]
#[command(version)]
struct Args {
    /// Random seed for map and army generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON engine configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of battles to play before stopping
    #[arg(long, default_value_t = 1)]
    battles: u32,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 200_000)]
    max_ticks: u64,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Outcome of a headless run.
#[derive(Debug, Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    elapsed_seconds: f64,
    battles: Vec<BattleSummary>,
    statistics: GameStatistics,
}

#[derive(Debug, Serialize)]
struct BattleSummary {
    winner: Team,
    survivors: usize,
    turns: u64,
}

fn main() -> TacticaResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);

    log::info!("Starting Tactica v{}", tactica::VERSION);

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.generation.seed = seed;
    }

    let summary = run(&args, config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .format_timestamp(None)
            .init();
    }
}

fn run(args: &Args, config: EngineConfig) -> TacticaResult<RunSummary> {
    let seed = config.generation.seed;
    log::info!("Generating skirmish with seed {}", seed);

    let mut state = GameState::generate(config)?;
    let mut commander = AutoCommander::new(seed);
    let delta = DeltaTime::from_secs(1.0 / TARGET_FPS as f64);

    let mut battles = Vec::new();
    let mut ticks = 0;
    while ticks < args.max_ticks && (battles.len() as u32) < args.battles {
        commander.tick(delta, &mut state);
        for event in state.tick(delta) {
            match event {
                GameEvent::CombatStarted { attacker, defender } => {
                    log::info!("Battle between {} and {} begins", attacker, defender);
                }
                GameEvent::CombatEnded {
                    winner,
                    survivors,
                    turns,
                    ..
                } => {
                    log::info!("Team {} wins after {} turns", winner, turns);
                    battles.push(BattleSummary {
                        winner,
                        survivors,
                        turns,
                    });
                }
                _ => {}
            }
        }
        ticks += 1;

        if state.mode() == GameMode::Overworld && !has_opponents(&state) {
            log::info!("No hostile parties left on the map");
            break;
        }
    }
    if ticks >= args.max_ticks {
        log::warn!("Stopped after {} ticks", ticks);
    }

    Ok(RunSummary {
        seed,
        ticks,
        elapsed_seconds: state.elapsed(),
        battles,
        statistics: state.statistics().clone(),
    })
}

fn has_opponents(state: &GameState) -> bool {
    let mut teams = state.overworld().parties().map(|party| party.team);
    match teams.next() {
        Some(first) => teams.any(|team| team != first),
        None => false,
    }
}

fn print_summary(summary: &RunSummary) {
    println!("Seed {}: {} ticks, {:.1}s of game time", summary.seed, summary.ticks, summary.elapsed_seconds);
    for (index, battle) in summary.battles.iter().enumerate() {
        println!(
            "  Battle {}: {} wins with {} survivors after {} turns",
            index + 1,
            battle.winner,
            battle.survivors,
            battle.turns
        );
    }
    let stats = &summary.statistics;
    println!(
        "  {} steps, {} strikes, {} damage, {} units lost",
        stats.steps_taken, stats.strikes, stats.damage_dealt, stats.units_lost
    );
}
