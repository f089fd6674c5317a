// In app/src/optimizer.rs

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use app_config::AppSettings;
use core_types::{Bar, Signal};
use itertools::Itertools;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strategies::Strategy;
use strategies::magic_nine::MagicNine;
use strategies::types::MagicNineSettings;
use toml::Value;

// --- Structs for deserializing optimizer.toml ---

#[derive(Deserialize, Debug)]
pub struct OptimizerConfig {
    pub job: JobSettings,

    // Every other top-level table, keyed by name (e.g. "magic_nine_params").
    #[serde(flatten)]
    pub strategy_params: HashMap<String, Value>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct JobSettings {
    pub name: String,
    pub strategy_to_optimize: String,
    /// Bars after a signal at which its direction is checked.
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Parameter sets with fewer evaluated signals are not ranked.
    #[serde(default)]
    pub min_signals: u32,
}

fn default_horizon() -> usize {
    5
}

/// How well one parameter set's signals anticipated the move `horizon` bars later.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub params: MagicNineSettings,
    pub signals: u32,
    pub hits: u32,
    pub hit_rate: f64,
}

// --- Public API for the Optimizer Module ---

pub fn load_optimizer_config(path: &Path) -> Result<OptimizerConfig> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Expands every `{ start, end, step }` range of the job's parameter table and
/// returns the cartesian product as strategy settings.
pub fn generate_parameter_sets(config: &OptimizerConfig) -> Result<Vec<MagicNineSettings>> {
    let strategy_key = format!("{}_params", config.job.strategy_to_optimize);

    let params_value = config.strategy_params.get(&strategy_key).ok_or_else(|| {
        anyhow::anyhow!(
            "Parameter table '{}' not found in optimizer config. Available tables are: {:?}",
            strategy_key,
            config.strategy_params.keys()
        )
    })?;
    let params_table = params_value
        .as_table()
        .ok_or_else(|| anyhow::anyhow!("'{}' must be a TOML table.", strategy_key))?;

    let keys: Vec<&String> = params_table.keys().collect();
    let value_lists = params_table
        .iter()
        .map(|(key, value)| expand_value(value).with_context(|| format!("Invalid range for '{}'", key)))
        .collect::<Result<Vec<_>>>()?;

    let combinations: Vec<Vec<Value>> = if value_lists.is_empty() {
        vec![Vec::new()]
    } else {
        value_lists.into_iter().multi_cartesian_product().collect()
    };

    combinations
        .into_iter()
        .map(|combination| -> Result<MagicNineSettings> {
            let table: toml::map::Map<String, Value> = keys.iter().map(|k| (*k).clone()).zip(combination).collect();
            match config.job.strategy_to_optimize.as_str() {
                "magic_nine" => {
                    let settings: MagicNineSettings = Value::Table(table).try_into()?;
                    Ok(settings)
                }
                unknown => anyhow::bail!("Unknown strategy '{}' in optimizer config", unknown),
            }
        })
        .collect()
}

/// Expands a `{ start, end, step }` table into its values; anything else is a fixed value.
fn expand_value(value: &Value) -> Result<Vec<Value>> {
    let Some(table) = value.as_table() else {
        return Ok(vec![value.clone()]);
    };
    let (Some(start), Some(end)) = (table.get("start"), table.get("end")) else {
        return Ok(vec![value.clone()]);
    };

    if let (Some(start), Some(end)) = (start.as_integer(), end.as_integer()) {
        let step = table.get("step").and_then(|v| v.as_integer()).unwrap_or(1);
        if step <= 0 {
            anyhow::bail!("step must be positive, got {}", step);
        }
        return Ok((start..=end).step_by(step as usize).map(Value::Integer).collect());
    }

    let as_float = |v: &Value| v.as_float().or_else(|| v.as_integer().map(|i| i as f64));
    let (Some(start), Some(end)) = (as_float(start), as_float(end)) else {
        anyhow::bail!("start and end must be numbers");
    };
    let step = table.get("step").and_then(as_float).unwrap_or(1.0);
    if step <= 0.0 {
        anyhow::bail!("step must be positive, got {}", step);
    }
    let mut vals = vec![];
    let mut v = start;
    while v <= end + 1e-8 {
        vals.push(Value::Float(v));
        v += step;
    }
    Ok(vals)
}

/// Replays `bars` through a fresh strategy and scores each directional signal
/// against the close `horizon` bars later.
pub fn evaluate(settings: &MagicNineSettings, bars: &[Bar], horizon: usize) -> Result<OptimizationResult> {
    let mut strategy = MagicNine::new(settings.clone())?;
    let mut signals = 0u32;
    let mut hits = 0u32;

    for (i, bar) in bars.iter().enumerate() {
        let signal = strategy.assess(bar);
        let Some(future) = bars.get(i + horizon) else {
            continue;
        };
        match signal {
            Signal::GoLong { .. } => {
                signals += 1;
                if future.close > bar.close {
                    hits += 1;
                }
            }
            Signal::GoShort { .. } => {
                signals += 1;
                if future.close < bar.close {
                    hits += 1;
                }
            }
            Signal::Hold => {}
        }
    }

    Ok(OptimizationResult {
        params: settings.clone(),
        signals,
        hits,
        hit_rate: if signals > 0 { hits as f64 / signals as f64 } else { 0.0 },
    })
}

/// The main parallel engine for running an optimization job.
pub fn run_optimization(
    app_settings: &AppSettings,
    job_settings: &JobSettings,
    bars: &[Bar],
    param_sets: Vec<MagicNineSettings>,
) -> Result<Vec<OptimizationResult>> {
    tracing::info!(cores = app_settings.optimizer_cores, "Configuring Rayon thread pool.");
    let pool = ThreadPoolBuilder::new()
        .num_threads(app_settings.optimizer_cores as usize)
        .build()
        .context("Failed to build Rayon thread pool")?;

    let horizon = job_settings.horizon;
    let results = pool.install(|| {
        param_sets
            .par_iter()
            .filter_map(|params| match evaluate(params, bars, horizon) {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::error!(error = %e, ?params, "A single evaluation run failed.");
                    None
                }
            })
            .collect::<Vec<_>>()
    });

    tracing::info!(job = %job_settings.name, evaluated = results.len(), "Optimization runs finished.");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use rust_decimal::Decimal;

    const CONFIG: &str = r#"
        [job]
        name = "test"
        strategy_to_optimize = "magic_nine"
        horizon = 2

        [magic_nine_params]
        lookback = { start = 1, end = 3 }
        signal_threshold = { start = 2, end = 6, step = 2 }
        confidence = 0.5
    "#;

    fn bars(closes: &[i64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar {
                timestamp: start + TimeDelta::days(i as i64),
                close: Decimal::from(*c),
            })
            .collect()
    }

    #[test]
    fn expands_ranges_into_cartesian_product() {
        let config: OptimizerConfig = toml::from_str(CONFIG).unwrap();
        let sets = generate_parameter_sets(&config).unwrap();

        assert_eq!(sets.len(), 9);
        assert!(sets.iter().all(|s| s.confidence == 0.5));
        assert!(sets.iter().any(|s| s.lookback == 3 && s.signal_threshold == 6));
    }

    #[test]
    fn missing_table_and_bad_step_are_errors() {
        let mut config: OptimizerConfig = toml::from_str(CONFIG).unwrap();
        config.job.strategy_to_optimize = "supertrend".into();
        assert!(generate_parameter_sets(&config).is_err());

        let bad: OptimizerConfig = toml::from_str(
            "[job]\nname = \"x\"\nstrategy_to_optimize = \"magic_nine\"\n[magic_nine_params]\nlookback = { start = 1, end = 3, step = 0 }\n",
        )
        .unwrap();
        assert!(generate_parameter_sets(&bad).is_err());
    }

    #[test]
    fn float_ranges_are_inclusive() {
        let value: Value = toml::from_str::<toml::Table>("r = { start = 0.5, end = 1.0, step = 0.25 }")
            .unwrap()
            .remove("r")
            .unwrap();
        assert_eq!(expand_value(&value).unwrap().len(), 3);
    }

    #[test]
    fn scores_signals_against_forward_close() {
        let settings = MagicNineSettings {
            lookback: 1,
            signal_threshold: 2,
            confidence: 0.5,
        };
        // Buy at index 2 (98), close two bars later is 100: a hit.
        // Sell at index 4 (100), close two bars later is 101: a miss.
        let result = evaluate(&settings, &bars(&[100, 99, 98, 99, 100, 100, 101]), 2).unwrap();
        assert_eq!(result.signals, 2);
        assert_eq!(result.hits, 1);
        assert!((result.hit_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn parallel_run_evaluates_every_set() {
        let config: OptimizerConfig = toml::from_str(CONFIG).unwrap();
        let sets = generate_parameter_sets(&config).unwrap();
        let app = AppSettings {
            optimizer_cores: 2,
            ..AppSettings::default()
        };
        let results = run_optimization(&app, &config.job, &bars(&[5, 4, 3, 2, 1, 2, 3, 4, 5, 6]), sets).unwrap();
        assert_eq!(results.len(), 9);
    }
}
