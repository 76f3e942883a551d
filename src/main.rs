//! One Second Left headless driver
//!
//! Plays runs with the autopilot at a fixed frame rate and prints a summary
//! of each. Useful for balancing tuning files and checking daily seeds.

use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;

use one_second_left::game::RunSummary;
use one_second_left::score::BestScoreStore;
use one_second_left::sim::{DATE_KEY_FORMAT, RunSeedMode};
use one_second_left::{FrameInput, Game, Settings, Tuning};

#[derive(Parser, Debug)]
#[command(
    name = "one-second-left",
    version,
    about = "Play One Second Left headless with the autopilot"
)]
struct Cli {
    /// Seed for normal runs (implies deterministic simulation).
    #[arg(long)]
    seed: Option<u64>,

    /// Play the daily challenge instead of a normal run.
    #[arg(long)]
    daily: bool,

    /// Challenge date as yyyy-mm-dd (defaults to today, per settings).
    #[arg(long)]
    date: Option<String>,

    /// Longest run to simulate, in seconds.
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,

    /// Frames per second fed to the simulation.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Force fixed-step simulation with a seeded RNG.
    #[arg(long)]
    deterministic: bool,

    /// Number of consecutive runs.
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Tuning overrides as JSON.
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Settings file as JSON.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Where to keep the best score.
    #[arg(long)]
    best_score: Option<PathBuf>,

    /// Print summaries as JSON lines.
    #[arg(long)]
    json: bool,

    /// Print the effective tuning as JSON and exit.
    #[arg(long)]
    dump_tuning: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.fps == 0 {
        bail!("--fps must be at least 1");
    }
    if !(cli.seconds.is_finite() && cli.seconds > 0.0) {
        bail!("--seconds must be a positive number");
    }

    let mut tuning = match &cli.tuning {
        Some(path) => Tuning::load(path)
            .with_context(|| format!("failed to load tuning from {}", path.display()))?,
        None => Tuning::default(),
    };
    if cli.deterministic || cli.seed.is_some() {
        tuning.spawner.deterministic_simulation = true;
    }
    if cli.dump_tuning {
        println!("{}", tuning.sanitized().to_json_pretty()?);
        return Ok(());
    }

    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if cli.daily {
        settings.run_seed_mode = RunSeedMode::DailyChallenge;
    }

    let today = match &cli.date {
        Some(date) => parse_date_key(date)?,
        None => settings.daily_date_key(SystemTime::now()),
    };

    let mut game = Game::new(tuning, settings);
    if let Some(path) = cli.best_score {
        game = game.with_best_score_store(BestScoreStore::new(path));
    }
    game.set_seed_override(cli.seed);

    log::info!("One Second Left (headless) starting...");
    let dt = 1.0 / cli.fps as f32;
    let max_frames = (cli.seconds * cli.fps as f32).ceil() as u64;
    let input = FrameInput {
        idle_mode: true,
        ..Default::default()
    };

    for _ in 0..cli.runs.max(1) {
        game.start_run(&today);
        for _ in 0..max_frames {
            if game.frame(dt, &input).death.is_some() {
                break;
            }
        }

        let summary = game.summary();
        if cli.json {
            println!("{}", serde_json::to_string(&summary)?);
        } else {
            print_summary(&summary);
        }
    }

    Ok(())
}

/// Parse a calendar date and return it in canonical key form
fn parse_date_key(date: &str) -> Result<String> {
    let day = NaiveDate::parse_from_str(date, DATE_KEY_FORMAT)
        .with_context(|| format!("--date must be a calendar date as yyyy-mm-dd, got {date:?}"))?;
    Ok(day.format(DATE_KEY_FORMAT).to_string())
}

fn print_summary(summary: &RunSummary) {
    let mode = match &summary.challenge_date {
        Some(date) => format!("{} {date}", summary.mode.as_str()),
        None => summary.mode.as_str().to_string(),
    };
    let outcome = match summary.death_cause {
        Some(cause) => format!("died ({cause})"),
        None => "survived".to_string(),
    };

    println!("Run {} [{mode}] seed={}", summary.run_index, summary.seed);
    println!(
        "  {outcome} after {:.2}s at speed {:.2}",
        summary.elapsed_seconds, summary.final_speed
    );
    println!(
        "  score {:.1} (best {:.1}{})",
        summary.score,
        summary.best_score,
        if summary.new_best { ", new best!" } else { "" }
    );
    println!(
        "  walls {} | near misses {} | best combo {}",
        summary.walls_spawned, summary.near_misses, summary.best_combo
    );
}
