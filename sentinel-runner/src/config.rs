//! Backtest configuration files.
//!
//! A config file is TOML with one `[backtest]` table naming what to run and
//! the engine sections (`[simulation]`, `[score]`, `[statistical]`, ...)
//! that tune how it runs. Every section is optional except `[backtest]`;
//! omitted fields take the engine defaults. The whole file is validated
//! before any episode starts.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sentinel_core::{EngineConfig, StrategyKind};

/// Content hash of a run configuration.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid engine config: {0}")]
    Engine(#[from] sentinel_core::ConfigError),
    #[error("config has no [backtest] table")]
    MissingBacktest,
    #[error("start date {start} is after end date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },
    #[error("symbol must not be empty")]
    EmptySymbol,
}

/// The `[backtest]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestSpec {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "default_strategy", deserialize_with = "strategy_by_name")]
    pub strategy: StrategyKind,
    /// CSV tick file. Synthetic ticks are generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
}

fn default_strategy() -> StrategyKind {
    StrategyKind::Statistical
}

/// Accepts the same names and aliases as the command line.
fn strategy_by_name<'de, D>(deserializer: D) -> Result<StrategyKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

/// One fully specified, validated backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSpec,
    pub engine: EngineConfig,
}

impl BacktestConfig {
    pub fn new(backtest: BacktestSpec, engine: EngineConfig) -> Result<Self, ConfigError> {
        let config = Self { backtest, engine };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), run_id = %config.run_id(), "loaded config");
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = toml::from_str(text)?;
        let backtest = table.remove("backtest").ok_or(ConfigError::MissingBacktest)?;
        let backtest: BacktestSpec = backtest.try_into()?;
        let engine: EngineConfig = toml::Value::Table(table).try_into()?;
        Self::new(backtest, engine)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.backtest.start > self.backtest.end {
            return Err(ConfigError::DateRange {
                start: self.backtest.start,
                end: self.backtest.end,
            });
        }
        self.engine.validate()?;
        Ok(())
    }

    /// Deterministic hash of the full configuration.
    ///
    /// Two runs with identical configs share a run id.
    pub fn run_id(&self) -> RunId {
        run_id_of(self)
    }
}

/// Hash any serializable config into a run id.
pub fn run_id_of<T: Serialize>(config: &T) -> RunId {
    // Plain structs of numbers and strings always serialize.
    let json = serde_json::to_vec(config).unwrap_or_default();
    blake3::hash(&json).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[backtest]
symbol = "BTC"
start = "2024-01-01"
end = "2024-03-31"
strategy = "contrarian"

[simulation]
initial_capital = 500.0
fee_rate = 0.002

[contrarian]
manipulation_cutoff = 0.8
"#;

    #[test]
    fn parses_sections_with_defaults() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.backtest.symbol, "BTC");
        assert_eq!(config.backtest.strategy, StrategyKind::Contrarian);
        assert_eq!(config.backtest.data, None);
        assert_eq!(config.engine.simulation.initial_capital, 500.0);
        assert_eq!(config.engine.simulation.fee_rate, 0.002);
        assert_eq!(config.engine.contrarian.manipulation_cutoff, 0.8);
        assert_eq!(config.engine.score, Default::default());
    }

    #[test]
    fn strategy_defaults_to_statistical() {
        let config = BacktestConfig::from_toml(
            "[backtest]\nsymbol = \"ETH\"\nstart = \"2024-01-01\"\nend = \"2024-01-31\"\n",
        )
        .unwrap();
        assert_eq!(config.backtest.strategy, StrategyKind::Statistical);
    }

    #[test]
    fn rejects_out_of_range_rate() {
        let text = format!("{SAMPLE}\n[score]\nhold_penalty_rate = 1.5\n");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Engine(_))
        ));
    }

    #[test]
    fn strategy_aliases_accepted() {
        let text = SAMPLE.replace("\"contrarian\"", "\"buy-and-hold\"");
        let config = BacktestConfig::from_toml(&text).unwrap();
        assert_eq!(config.backtest.strategy, StrategyKind::BuyHold);
    }

    #[test]
    fn unknown_strategy_is_a_parse_error() {
        let text = SAMPLE.replace("\"contrarian\"", "\"martingale\"");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_unknown_field() {
        let text = SAMPLE.replace("fee_rate", "fee");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_missing_backtest_table() {
        assert!(matches!(
            BacktestConfig::from_toml("[simulation]\nfee_rate = 0.001\n"),
            Err(ConfigError::MissingBacktest)
        ));
    }

    #[test]
    fn rejects_inverted_dates() {
        let text = SAMPLE.replace("2024-03-31", "2023-12-31");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::DateRange { .. })
        ));
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let a = BacktestConfig::from_toml(SAMPLE).unwrap();
        let b = BacktestConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(a.run_id(), b.run_id());
        assert_eq!(a.run_id().len(), 64);

        let mut c = a.clone();
        c.engine.score.hold_penalty_rate = 0.10;
        assert_ne!(a.run_id(), c.run_id());
    }
}
