// In crates/app-config/src/types.rs

use analytics::AnalysisSettings;
use core_types::StrategyConfig;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    #[serde(default)]
    pub app: AppSettings,
    /// Parameters for return and ratio calculations.
    #[serde(default)]
    pub analysis: AnalysisSettings,
    /// Strategies run by the `signals` command, one `[[strategies]]` table each.
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,
    /// The log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_optimizer_cores")]
    pub optimizer_cores: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            optimizer_cores: default_optimizer_cores(),
        }
    }
}

fn default_environment() -> String {
    "development".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_optimizer_cores() -> u32 {
    4
}
