use serde::Deserialize;
use toml::Value;

/// One `[[strategies]]` entry from the settings files.
#[derive(Deserialize, Debug, Clone)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    // This will hold the `params = { ... }` table from the TOML
    #[serde(default = "empty_params")]
    pub params: Value,
}

fn default_weight() -> f64 {
    1.0
}

fn empty_params() -> Value {
    Value::Table(toml::map::Map::new())
}
