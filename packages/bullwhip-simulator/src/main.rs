//! Bullwhip simulator CLI: runs whole games in memory with local ordering
//! policies and writes per-game metrics.
//!
//! Games use the same week transition as the server, without the lobby,
//! the websocket layer or any decision delays. `BEER_*` overrides apply.

mod metrics;
mod output;
mod simulator;
mod types;

use std::time::Instant;

use backend::ai::{policy_by_name, registry::registered_policies, OrderPolicy};
use backend::domain::{GameRules, ROLES};
use backend::GameConfig;
use clap::Parser;
use metrics::{build_game_metrics, MetricsInput};
use output::OutputWriter;
use simulator::{game_rng, jittered_rules, GameResult, Simulator, SimulatorError};
use tracing::{info, warn};
use types::{MetricsLevel, OutputFormat};

#[derive(Parser)]
#[command(name = "bullwhip-simulator")]
#[command(about = "Headless beer distribution game simulator")]
struct Args {
    /// Number of games to simulate
    #[arg(short, long, default_value = "1")]
    games: u32,

    /// Policy for all seats (shortcut to set all 4 seats to the same policy)
    #[arg(long, conflicts_with_all = ["seat0", "seat1", "seat2", "seat3"])]
    seats: Option<String>,

    /// Policy for the retailer
    #[arg(long, default_value = "pass-through")]
    seat0: String,

    /// Policy for the wholesaler
    #[arg(long, default_value = "pass-through")]
    seat1: String,

    /// Policy for the regional warehouse
    #[arg(long, default_value = "pass-through")]
    seat2: String,

    /// Policy for the factory
    #[arg(long, default_value = "pass-through")]
    seat3: String,

    /// Weeks per game
    #[arg(long)]
    max_weeks: Option<u32>,

    /// Randomly shift each demand level by up to this many units per game
    #[arg(long, default_value = "0")]
    demand_jitter: u32,

    /// Seed for demand jitter
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Show output summary and file paths
    #[arg(long)]
    show_output: bool,

    /// Output directory for results
    #[arg(long, default_value = "./simulation-results")]
    output_dir: String,

    /// Output format
    #[arg(long, default_value = "jsonl")]
    output_format: OutputFormat,

    /// Compress output files
    #[arg(long)]
    compress: bool,

    /// Metrics detail level
    #[arg(long, default_value = "basic")]
    metrics_level: MetricsLevel,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        "debug"
    } else if args.show_output {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let names: [String; ROLES] = match &args.seats {
        Some(all) => std::array::from_fn(|_| all.clone()),
        None => [
            args.seat0.clone(),
            args.seat1.clone(),
            args.seat2.clone(),
            args.seat3.clone(),
        ],
    };
    let policies = build_policies(&names)?;

    let config = GameConfig::from_env()?;
    let mut base_rules = config.rules.clone();
    if let Some(weeks) = args.max_weeks {
        if weeks == 0 {
            return Err("--max-weeks must be at least 1".into());
        }
        base_rules.max_weeks = weeks;
    }

    if args.show_output {
        info!(games = args.games, policies = ?names, max_weeks = base_rules.max_weeks, "starting simulator");
    }

    let mut writer = OutputWriter::new(&args.output_dir, &args.output_format, args.compress)?;

    let start = Instant::now();
    let mut results = Vec::new();
    let mut errors = 0;

    for game_no in 1..=args.games {
        let game_start = Instant::now();
        let rules = jittered_rules(&base_rules, args.demand_jitter, &mut game_rng(args.seed, game_no));

        match run_game(game_no, rules, config.max_order_quantity, &policies) {
            Ok(result) => {
                let metrics = build_game_metrics(
                    MetricsInput {
                        game_id: game_no,
                        seed: args.seed,
                        policies: names.clone(),
                        total_games: args.games,
                        duration_ms: game_start.elapsed().as_secs_f64() * 1000.0,
                        level: &args.metrics_level,
                    },
                    &result,
                );
                if let Err(e) = writer.write_game(&metrics) {
                    warn!(game = game_no, error = %e, "failed to write metrics");
                }
                if args.verbose {
                    info!(game = game_no, total_cost = result.group.cost, "game completed");
                }
                results.push(result);
            }
            Err(e) => {
                errors += 1;
                warn!(game = game_no, error = %e, "game failed");
            }
        }
    }

    let elapsed = start.elapsed();
    let (detail_path, csv_path) = writer.output_paths();
    let (detail_path, csv_path) = (detail_path.to_path_buf(), csv_path.to_path_buf());
    writer.finish()?;

    if args.show_output {
        info!(path = %detail_path.display(), "detailed results written");
        info!(path = %csv_path.display(), "summary written");
        print_summary(&results, &names, errors, elapsed, args.games);
    }

    Ok(())
}

fn build_policies(names: &[String; ROLES]) -> Result<[Box<dyn OrderPolicy>; ROLES], SimulatorError> {
    let [retailer, wholesaler, warehouse, factory] = names.each_ref().map(|name| {
        policy_by_name(name)
            .map(|factory| (factory.make)())
            .ok_or_else(|| {
                let known: Vec<&str> = registered_policies().iter().map(|f| f.name).collect();
                warn!(policy = %name, known = ?known, "unknown policy");
                SimulatorError::UnknownPolicy(name.clone())
            })
    });
    Ok([retailer?, wholesaler?, warehouse?, factory?])
}

fn run_game(
    game_no: u32,
    rules: GameRules,
    max_order_quantity: u32,
    policies: &[Box<dyn OrderPolicy>; ROLES],
) -> Result<GameResult, SimulatorError> {
    Simulator::new(rules, u64::from(game_no), max_order_quantity).simulate_game(policies)
}

fn print_summary(
    results: &[GameResult],
    names: &[String; ROLES],
    errors: u32,
    elapsed: std::time::Duration,
    total: u32,
) {
    println!("\n=== Simulation Summary ===");
    println!("Games completed: {}/{}", results.len(), total);
    if errors > 0 {
        println!("Errors: {}", errors);
    }
    println!("Total time: {:?}", elapsed);
    if results.is_empty() {
        return;
    }

    let games = results.len() as f64;
    let avg_total = results.iter().map(|r| r.group.cost).sum::<f64>() / games;
    println!("Average team cost: {:.1}", avg_total);

    println!("\n=== Results by Role ===");
    for (i, name) in names.iter().enumerate() {
        let costs: Vec<f64> = results.iter().map(|r| r.group.participants[i].cost).collect();
        let avg = costs.iter().sum::<f64>() / games;
        let min = costs.iter().copied().fold(f64::INFINITY, f64::min);
        let max = costs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let amplification: Vec<f64> = results
            .iter()
            .filter_map(|r| {
                metrics::amplification_ratio(
                    &r.group.participants[i].history.orders,
                    &r.customer_demand(),
                )
            })
            .collect();
        let avg_amp = if amplification.is_empty() {
            0.0
        } else {
            amplification.iter().sum::<f64>() / amplification.len() as f64
        };
        let role = &results[0].group.participants[i];
        println!(
            "{} ({}): avg cost={:.1}, min={:.1}, max={:.1}, amplification={:.2}",
            role.role_kind(),
            name,
            avg,
            min,
            max,
            avg_amp
        );
    }
}
