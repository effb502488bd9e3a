//! Backtest runner — wires together tick loading, the simulation environment,
//! a decision protocol and metrics.
//!
//! Entry points:
//! - `run()`: the orchestrator contract, strategy + symbol + range + engine config.
//! - `run_backtest()`: same, from a `BacktestConfig` and an explicit tick source.
//! - `execute()`: runs one episode on pre-loaded ticks. Used by compare and sweep,
//!   which load the series once and fan out.
//!
//! Cancellation is checked between steps; a cancelled episode produces no report.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sentinel_core::engine::{DataError, EngineError};
use sentinel_core::strategy::FactoryError;
use sentinel_core::{
    create_protocol, EngineConfig, EpisodeHistory, MarketTick, SimulationEnv, StrategyKind,
};

use crate::config::{BacktestConfig, BacktestSpec, ConfigError, RunId};
use crate::data_loader::{dataset_hash, LoadError, TickSource};
use crate::metrics::{MetricsError, PerformanceMetrics};

/// Errors from the runner, named by the phase that failed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data load error: {0}")]
    DataLoad(#[from] LoadError),
    #[error("invalid tick series: {0}")]
    Data(#[from] DataError),
    #[error("strategy error: {0}")]
    Strategy(#[from] FactoryError),
    #[error("episode error: {0}")]
    Episode(#[from] EngineError),
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("cancelled after {completed} steps")]
    Cancelled { completed: usize },
}

impl From<sentinel_core::ConfigError> for RunError {
    fn from(err: sentinel_core::ConfigError) -> Self {
        RunError::Config(ConfigError::Engine(err))
    }
}

/// Where the ticks of a run came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub source: String,
    pub hash: String,
    pub ticks: usize,
}

impl DatasetInfo {
    pub fn describe(source: &dyn TickSource, ticks: &[MarketTick]) -> Self {
        Self {
            source: source.name().to_string(),
            hash: dataset_hash(ticks),
            ticks: ticks.len(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == "synthetic"
    }
}

/// Complete result of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub dataset: DatasetInfo,
    pub metrics: PerformanceMetrics,
    pub history: EpisodeHistory,
}

impl BacktestReport {
    pub fn strategy(&self) -> StrategyKind {
        self.config.backtest.strategy
    }
}

/// Run `strategy` on `symbol` over `start..=end`.
pub fn run(
    strategy: StrategyKind,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    engine: EngineConfig,
    source: &dyn TickSource,
) -> Result<BacktestReport, RunError> {
    let spec = BacktestSpec {
        symbol: symbol.to_string(),
        start,
        end,
        strategy,
        data: None,
    };
    let config = BacktestConfig::new(spec, engine)?;
    run_backtest(&config, source, &AtomicBool::new(false))
}

/// Load ticks for `config` from `source` and run one episode.
pub fn run_backtest(
    config: &BacktestConfig,
    source: &dyn TickSource,
    cancel: &AtomicBool,
) -> Result<BacktestReport, RunError> {
    let ticks = load_ticks(&config.backtest, source)?;
    let dataset = DatasetInfo::describe(source, &ticks);
    execute(config, ticks, dataset, cancel)
}

pub fn load_ticks(spec: &BacktestSpec, source: &dyn TickSource) -> Result<Vec<MarketTick>, RunError> {
    Ok(source.load(&spec.symbol, spec.start, spec.end)?)
}

/// Run one episode on pre-loaded ticks.
pub fn execute(
    config: &BacktestConfig,
    ticks: Vec<MarketTick>,
    dataset: DatasetInfo,
    cancel: &AtomicBool,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let run_id = config.run_id();
    let spec = &config.backtest;

    tracing::info!(
        run_id = %short_id(&run_id),
        strategy = %spec.strategy,
        symbol = %spec.symbol,
        ticks = ticks.len(),
        "starting episode"
    );

    let history = run_episode(spec.strategy, &config.engine, &spec.symbol, ticks, cancel)?;
    let metrics = PerformanceMetrics::compute(&history, config.engine.simulation.periods_per_year)?;

    tracing::info!(
        run_id = %short_id(&run_id),
        strategy = %spec.strategy,
        steps = metrics.steps,
        final_net_worth = metrics.final_net_worth,
        sharpe = metrics.sharpe_ratio,
        final_score = metrics.final_score,
        "episode finished"
    );

    Ok(BacktestReport {
        run_id,
        config: config.clone(),
        dataset,
        metrics,
        history,
    })
}

/// Drive a fresh protocol through one full episode.
///
/// Returns the history of the terminated episode.
pub fn run_episode(
    strategy: StrategyKind,
    engine: &EngineConfig,
    asset: &str,
    ticks: Vec<MarketTick>,
    cancel: &AtomicBool,
) -> Result<EpisodeHistory, RunError> {
    let mut env = SimulationEnv::new(engine)?;
    let mut protocol = create_protocol(strategy, engine, asset)?;
    protocol.reset();

    let mut observation = env.reset(ticks)?;
    loop {
        if cancel.load(Ordering::Relaxed) {
            tracing::warn!(strategy = %strategy, completed = env.cursor(), "episode cancelled");
            return Err(RunError::Cancelled {
                completed: env.cursor(),
            });
        }
        let decision = protocol.decide(&observation);
        let result = env.step_with_rationale(decision.action, decision.rationale)?;
        if result.terminated {
            break;
        }
        observation = result.observation;
    }

    Ok(env.into_history()?)
}

fn short_id(run_id: &str) -> &str {
    &run_id[..run_id.len().min(12)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::SyntheticTickSource;
    use chrono::{Duration, TimeZone, Utc};
    use sentinel_core::engine::TerminationReason;
    use sentinel_core::Action;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ticks(closes: &[f64]) -> Vec<MarketTick> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| MarketTick {
                timestamp: t0 + Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1_000.0,
                sentiment: None,
            })
            .collect()
    }

    #[test]
    fn episode_runs_to_data_exhaustion() {
        let history = run_episode(
            StrategyKind::BuyHold,
            &EngineConfig::default(),
            "BTC",
            ticks(&[100.0, 101.0, 102.0]),
            &AtomicBool::new(false),
        )
        .unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.steps[0].action, Action::Buy);
        assert_eq!(history.termination, Some(TerminationReason::DataExhausted));
    }

    #[test]
    fn cancelled_before_first_step() {
        let err = run_episode(
            StrategyKind::Statistical,
            &EngineConfig::default(),
            "BTC",
            ticks(&[100.0; 10]),
            &AtomicBool::new(true),
        )
        .unwrap_err();
        assert!(matches!(err, RunError::Cancelled { completed: 0 }));
    }

    #[test]
    fn empty_series_is_a_data_error() {
        let err = run_episode(
            StrategyKind::Statistical,
            &EngineConfig::default(),
            "BTC",
            Vec::new(),
            &AtomicBool::new(false),
        )
        .unwrap_err();
        assert!(matches!(err, RunError::Data(DataError::Empty)));
    }

    #[test]
    fn run_produces_report_with_metrics() {
        let report = run(
            StrategyKind::Statistical,
            "BTC",
            date(2024, 1, 1),
            date(2024, 6, 30),
            EngineConfig::default(),
            &SyntheticTickSource::new(),
        )
        .unwrap();
        assert_eq!(report.strategy(), StrategyKind::Statistical);
        assert!(report.dataset.is_synthetic());
        assert_eq!(report.dataset.ticks, 182);
        assert_eq!(report.metrics.steps, report.history.len());
        assert_eq!(report.run_id, report.config.run_id());
    }

    #[test]
    fn invalid_engine_config_fails_before_loading() {
        let mut engine = EngineConfig::default();
        engine.simulation.fee_rate = -0.1;
        let err = run(
            StrategyKind::Swing,
            "BTC",
            date(2024, 1, 1),
            date(2024, 1, 31),
            engine,
            &SyntheticTickSource::new(),
        )
        .unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::Engine(_))));
    }
}
