// In app/src/analyzer.rs

use serde::Serialize;

use crate::optimizer::OptimizationResult;

#[derive(Debug, Serialize)]
pub struct RankedResult {
    pub score: f64,
    pub result: OptimizationResult,
}

/// Ranks the results of an optimization job, best first.
pub fn rank_results(results: Vec<OptimizationResult>, min_signals: u32) -> Vec<RankedResult> {
    let total_results = results.len();

    let mut ranked: Vec<RankedResult> = results
        .into_iter()
        .filter_map(|result| {
            // Too few signals make the hit rate meaningless.
            if result.signals < min_signals.max(1) {
                return None;
            }
            Some(RankedResult {
                score: calculate_score(&result),
                result,
            })
        })
        .collect();

    tracing::info!(total_results, passing_results = ranked.len(), "Finished scoring results.");

    // Sort by score in descending order (higher is better)
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Hit rate with a small bonus for parameter sets that signal more often.
/// Higher scores are better.
fn calculate_score(result: &OptimizationResult) -> f64 {
    const HIT_RATE_WEIGHT: f64 = 100.0;
    const SIGNAL_COUNT_WEIGHT: f64 = 2.0;

    result.hit_rate * HIT_RATE_WEIGHT + (result.signals as f64).ln_1p() * SIGNAL_COUNT_WEIGHT
}
