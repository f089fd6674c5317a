// In crates/app-config/src/lib.rs

use std::path::Path;

use config::{Config, Environment, File};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, Settings};

/// Loads the application settings from the `config/` directory.
///
/// Sources are layered, later ones overriding earlier ones:
/// 1. `config/base.toml`.
/// 2. An environment-specific file (e.g., `config/development.toml`), if present.
/// 3. Environment variables such as `APP_ANALYSIS__RISK_FREE_RATE=0.02`.
pub fn load_settings() -> Result<Settings> {
    load_settings_from(Path::new("config"))
}

/// Same as [`load_settings`] with an explicit configuration directory.
pub fn load_settings_from(dir: &Path) -> Result<Settings> {
    load_layers(dir, environment_source())
}

/// `APP_` followed by the key path with `__` between sections, so
/// `APP_ANALYSIS__RISK_FREE_RATE` sets `analysis.risk_free_rate`.
fn environment_source() -> Environment {
    Environment::with_prefix("APP").prefix_separator("_").separator("__")
}

fn load_layers(dir: &Path, env: Environment) -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());
    let base = dir.join("base");
    let overlay = dir.join(&environment);

    let settings = Config::builder()
        .add_source(File::with_name(&base.to_string_lossy()))
        .add_source(File::with_name(&overlay.to_string_lossy()).required(false))
        .add_source(env)
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    validate(&settings)?;

    Ok(settings)
}

fn validate(settings: &Settings) -> Result<()> {
    if settings.analysis.periods_per_year.is_some_and(|ppy| ppy <= 0.0) {
        return Err(Error::Invalid("analysis.periods_per_year must be positive".into()));
    }
    if settings.app.optimizer_cores == 0 {
        return Err(Error::Invalid("app.optimizer_cores must be at least 1".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::Frequency;
    use std::path::PathBuf;

    fn config_dir(name: &str, base: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("app-config-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("base.toml"), base).unwrap();
        dir
    }

    #[test]
    fn loads_base_file_with_defaults() {
        let dir = config_dir("defaults", "[app]\nlog_level = \"debug\"\n");
        let settings = load_settings_from(&dir).unwrap();

        assert_eq!(settings.app.log_level, "debug");
        assert_eq!(settings.app.optimizer_cores, 4);
        assert_eq!(settings.analysis.risk_free_rate, 0.01);
        assert!(settings.analysis.annualize);
        assert_eq!(settings.analysis.annualization_factor(), 252.0);
        assert!(settings.strategies.is_empty());
    }

    #[test]
    fn reads_analysis_and_strategies() {
        let dir = config_dir(
            "full",
            r#"
            [app]
            log_level = "info"

            [analysis]
            risk_free_rate = 0.02
            frequency = "weekly"

            [[strategies]]
            name = "magic_nine"
            params = { lookback = 4, signal_threshold = 9 }
            "#,
        );
        let settings = load_settings_from(&dir).unwrap();

        assert_eq!(settings.analysis.frequency, Frequency::Weekly);
        assert_eq!(settings.analysis.annualization_factor(), 52.0);
        assert_eq!(settings.strategies.len(), 1);
        assert_eq!(settings.strategies[0].name, "magic_nine");
        assert_eq!(
            settings.strategies[0].params.get("lookback").and_then(|v| v.as_integer()),
            Some(4)
        );
    }

    #[test]
    fn environment_overrides_use_single_underscore_after_prefix() {
        let dir = config_dir("env", "[app]\n[analysis]\nrisk_free_rate = 0.01\n");
        let vars = config::Map::from([
            ("APP_ANALYSIS__RISK_FREE_RATE".to_string(), "0.02".to_string()),
            ("APP_APP__LOG_LEVEL".to_string(), "warn".to_string()),
        ]);
        let settings = load_layers(&dir, environment_source().source(Some(vars))).unwrap();

        assert_eq!(settings.analysis.risk_free_rate, 0.02);
        assert_eq!(settings.app.log_level, "warn");
    }

    #[test]
    fn double_underscore_after_prefix_is_ignored() {
        let dir = config_dir("env-double", "[app]\n[analysis]\nrisk_free_rate = 0.01\n");
        let vars = config::Map::from([("APP__ANALYSIS__RISK_FREE_RATE".to_string(), "0.02".to_string())]);
        let settings = load_layers(&dir, environment_source().source(Some(vars))).unwrap();

        assert_eq!(settings.analysis.risk_free_rate, 0.01);
    }

    #[test]
    fn rejects_non_positive_factor() {
        let dir = config_dir("invalid", "[app]\n[analysis]\nperiods_per_year = 0.0\n");
        assert!(matches!(load_settings_from(&dir), Err(Error::Invalid(_))));
    }

    #[test]
    fn missing_base_file_is_an_error() {
        let dir = std::env::temp_dir().join("app-config-does-not-exist");
        assert!(matches!(load_settings_from(&dir), Err(Error::LoadError(_))));
    }
}
