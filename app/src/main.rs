// In app/src/main.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use analytics::{AnalyticsEngine, EvaluationRun, PerformanceReport};
use anyhow::{Context, Result};
use app_config::Settings;
use clap::{Parser, Subcommand};
use core_types::{Bar, Signal};
use strategies::Strategy;
use rayon::prelude::*;
use tracing_subscriber::prelude::*;

mod analyzer;
mod optimizer;

use crate::analyzer::RankedResult;
use crate::optimizer::{generate_parameter_sets, load_optimizer_config, run_optimization};

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Performance analytics and sequence signals for backtest runs.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Builds a performance report for each evaluation run.
    Report {
        /// JSON files holding `{ "equity": [...], "trades": [...] }`.
        #[arg(short, long = "run", required = true, num_args = 1..)]
        runs: Vec<PathBuf>,

        /// Print the reports as JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Reject out-of-order equity points and exits without a profit.
        #[arg(long)]
        checked: bool,
    },

    /// Runs the configured strategies over a price series and prints their signals.
    Signals {
        /// JSON array of `{ "timestamp", "close" }` bars.
        #[arg(short, long)]
        prices: PathBuf,
    },

    /// Sweeps strategy parameters and ranks them by forward hit rate.
    Optimize {
        /// JSON array of `{ "timestamp", "close" }` bars.
        #[arg(short, long)]
        prices: PathBuf,

        #[arg(long, default_value = "config/optimizer.toml")]
        config: PathBuf,
    },
}

// --- Main Application Entry Point ---

fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();
    let settings = app_config::load_settings().context("Failed to load settings")?;

    let level = settings.app.log_level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::filter::Targets::new().with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::info!(environment = %settings.app.environment, "Starting application");

    match cli.command {
        Commands::Report { runs, json, checked } => {
            handle_report(&settings, &runs, json, checked)?;
        }
        Commands::Signals { prices } => {
            handle_signals(&settings, &prices)?;
        }
        Commands::Optimize { prices, config } => {
            handle_optimize(&settings, &prices, &config)?;
        }
    }

    tracing::info!("Application has finished successfully.");

    Ok(())
}

/// Handles the logic for the `report` subcommand.
fn handle_report(settings: &Settings, paths: &[PathBuf], json: bool, checked: bool) -> Result<()> {
    let runs = paths.iter().map(|p| load_run(p)).collect::<Result<Vec<_>>>()?;
    tracing::info!(runs = runs.len(), "Loaded evaluation runs.");

    let engine = AnalyticsEngine::new(settings.analysis.clone());
    let reports = if checked {
        runs.par_iter()
            .map(|run| {
                engine
                    .build_checked(&run.equity, &run.trades)
                    .with_context(|| format!("Run '{}' is malformed", run_name(run)))
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        engine.build_many(&runs)
    };

    if json {
        let output: Vec<serde_json::Value> = runs
            .iter()
            .zip(&reports)
            .map(|(run, report)| serde_json::json!({ "name": run_name(run), "report": report }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (run, report) in runs.iter().zip(&reports) {
            print_report(run_name(run), report);
        }
    }
    Ok(())
}

/// Handles the logic for the `signals` subcommand.
fn handle_signals(settings: &Settings, prices: &Path) -> Result<()> {
    let bars = load_bars(prices)?;
    let mut active_strategies = strategies::factory::create_strategies(&settings.strategies)?;
    if active_strategies.is_empty() {
        anyhow::bail!("No strategy is configured in the config file.");
    }
    tracing::info!(bars = bars.len(), strategies = active_strategies.len(), "Replaying price series.");

    let mut emitted = 0usize;
    for bar in &bars {
        for strategy in active_strategies.iter_mut() {
            let signal = strategy.assess(bar);
            if signal != Signal::Hold {
                emitted += 1;
                println!("{}  {:<12} {:?}", bar.timestamp, strategy.name(), signal);
            }
        }
    }

    tracing::info!(emitted, "Signal replay finished.");
    Ok(())
}

/// Handles the logic for the `optimize` subcommand.
fn handle_optimize(settings: &Settings, prices: &Path, config_path: &Path) -> Result<()> {
    let start_time = Instant::now();
    tracing::info!("Starting optimization job...");

    let optimizer_config = load_optimizer_config(config_path)?;
    let param_sets = generate_parameter_sets(&optimizer_config)?;
    if param_sets.is_empty() {
        anyhow::bail!("No valid parameter sets were generated.");
    }
    tracing::info!("Starting optimization with {} parameter sets", param_sets.len());

    let bars = load_bars(prices)?;
    let results = run_optimization(&settings.app, &optimizer_config.job, &bars, param_sets)?;
    let ranked_results = analyzer::rank_results(results, optimizer_config.job.min_signals);

    print_optimization_report(&ranked_results);

    tracing::info!(duration = ?start_time.elapsed(), "Optimization job and analysis finished.");
    Ok(())
}

fn load_run(path: &Path) -> Result<EvaluationRun> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut run: EvaluationRun =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    if run.name.is_none() {
        run.name = path.file_stem().map(|s| s.to_string_lossy().into_owned());
    }
    Ok(run)
}

fn load_bars(path: &Path) -> Result<Vec<Bar>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn run_name(run: &EvaluationRun) -> &str {
    run.name.as_deref().unwrap_or("unnamed")
}

/// Helper function to print one performance report.
fn print_report(name: &str, report: &PerformanceReport) {
    let returns = &report.returns;
    let risk = &report.risk;
    let trades = &report.trades;

    println!("\n--- {} ---", name);
    println!(
        "  - Return: {:.2}% total | {:.2}% annualized | mean {:.4}% | stddev {:.4}%",
        returns.total * 100.0,
        returns.annualized * 100.0,
        returns.mean * 100.0,
        returns.stddev * 100.0
    );
    println!(
        "  - Risk: vol {:.2}% | Sharpe {:.2} | Sortino {:.2} | Calmar {:.2}",
        risk.annual_volatility * 100.0,
        risk.sharpe,
        risk.sortino,
        risk.calmar
    );
    println!(
        "  - Max Drawdown: {:.2}% over {} points ({} days) | {} episodes",
        risk.max_drawdown * 100.0,
        risk.max_drawdown_points,
        risk.max_drawdown_days.map_or_else(|| "-".to_string(), |d| d.to_string()),
        report.drawdowns.len()
    );
    println!(
        "  - Trades: {} ({} W / {} L / {} BE) | win rate {:.1}% | profit factor {:.2} | SQN {:.2} ({:?})",
        trades.count,
        trades.wins,
        trades.losses,
        trades.break_even,
        trades.win_rate * 100.0,
        trades.profit_factor,
        trades.sqn,
        trades.system_quality
    );
    println!(
        "  - Gross: +{} / -{} | commission {} | streaks {}W {}L | {:.2} trades/day",
        trades.gross_profit,
        trades.gross_loss,
        trades.total_commission,
        trades.longest_win_streak,
        trades.longest_loss_streak,
        trades.avg_trades_per_day
    );
    println!(
        "  - Net {} | avg trade {} | avg win {} | avg loss {} | win/loss {:.2} | expectancy {}",
        trades.net_profit,
        trades.avg_trade.round_dp(4),
        trades.avg_win.round_dp(4),
        trades.avg_loss.round_dp(4),
        trades.win_loss_ratio,
        trades.expectancy.round_dp(4)
    );
}

/// Helper function to print the final optimization summary.
fn print_optimization_report(results: &[RankedResult]) {
    println!("\n--- Optimization Job Complete ---");
    println!("---------------------------------");
    println!("Top 5 Parameter Sets by Score:");
    println!("---------------------------------");

    for (i, ranked) in results.iter().take(5).enumerate() {
        println!("\n[Rank {} | Score: {:.2}]", i + 1, ranked.score);
        println!(
            "  - Parameters: {}",
            serde_json::to_string(&ranked.result.params).unwrap_or_default()
        );
        println!(
            "  - Hit rate: {:.1}% ({} of {} signals)",
            ranked.result.hit_rate * 100.0,
            ranked.result.hits,
            ranked.result.signals
        );
    }
    println!("\n---------------------------------");

    if let Some(best) = results.first() {
        println!("Recommendation: The parameter set with the highest score is:");
        println!("  {}", serde_json::to_string_pretty(&best.result.params).unwrap_or_default());
    } else {
        println!("Recommendation: No parameter sets passed the minimum threshold.");
    }
}
