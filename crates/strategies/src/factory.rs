// In crates/strategies/src/factory.rs

use anyhow::Result;
use core_types::StrategyConfig;

use crate::Strategy;
use crate::magic_nine::MagicNine;
use crate::types::MagicNineSettings;

/// Builds one strategy instance per configured `[[strategies]]` entry.
pub fn create_strategies(configs: &[StrategyConfig]) -> Result<Vec<Box<dyn Strategy + Send + Sync>>> {
    let mut active_strategies = Vec::new();

    for strat_config in configs {
        let strategy_instance: Box<dyn Strategy + Send + Sync> = match strat_config.name.as_str() {
            "magic_nine" => {
                let settings: MagicNineSettings = strat_config.params.clone().try_into()?;
                Box::new(MagicNine::new(settings)?)
            }
            unknown => anyhow::bail!("Attempted to create unknown strategy: {}", unknown),
        };
        tracing::debug!(strategy = strategy_instance.name(), weight = strat_config.weight, "Strategy created.");
        active_strategies.push(strategy_instance);
    }

    Ok(active_strategies)
}
