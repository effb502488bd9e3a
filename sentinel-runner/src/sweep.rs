//! Experiment sweep — grid over strategies, hold-penalty rates and
//! risk-per-trade fractions.
//!
//! Every grid point is an isolated episode on the same ticks. Results are
//! ranked in memory with the comparison ordering; nothing is persisted.

use std::sync::atomic::AtomicBool;

use rayon::prelude::*;

use sentinel_core::StrategyKind;

use crate::compare::RankedTable;
use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::TickSource;
use crate::runner::{execute, load_ticks, BacktestReport, DatasetInfo, RunError};

/// Parameter grid for a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub strategies: Vec<StrategyKind>,
    pub hold_penalty_rates: Vec<f64>,
    pub risk_per_trade: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            strategies: StrategyKind::ALL.to_vec(),
            hold_penalty_rates: vec![0.0, 0.05, 0.10],
            risk_per_trade: vec![0.05, 0.10, 0.20],
        }
    }
}

impl ParamGrid {
    pub fn new(strategies: Vec<StrategyKind>) -> Self {
        Self {
            strategies,
            ..Self::default()
        }
    }

    pub fn with_hold_penalty_rates(mut self, rates: Vec<f64>) -> Self {
        self.hold_penalty_rates = rates;
        self
    }

    pub fn with_risk_per_trade(mut self, fractions: Vec<f64>) -> Self {
        self.risk_per_trade = fractions;
        self
    }

    /// Number of grid points.
    pub fn size(&self) -> usize {
        self.strategies.len() * self.hold_penalty_rates.len() * self.risk_per_trade.len()
    }

    /// One validated config per grid point, derived from `base`.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Result<Vec<BacktestConfig>, ConfigError> {
        let mut configs = Vec::with_capacity(self.size());
        for &strategy in &self.strategies {
            for &rate in &self.hold_penalty_rates {
                for &risk in &self.risk_per_trade {
                    let mut config = base.clone();
                    config.backtest.strategy = strategy;
                    config.engine.score.hold_penalty_rate = rate;
                    config.engine.simulation.risk_per_trade = risk;
                    config.validate()?;
                    configs.push(config);
                }
            }
        }
        Ok(configs)
    }
}

/// Runs parameter sweeps, optionally in parallel.
#[derive(Debug, Clone)]
pub struct Sweep {
    parallel: bool,
}

impl Default for Sweep {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl Sweep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    pub fn run(
        &self,
        grid: &ParamGrid,
        base: &BacktestConfig,
        source: &dyn TickSource,
        cancel: &AtomicBool,
    ) -> Result<RankedTable, RunError> {
        self.run_with_progress(grid, base, source, cancel, |_, _, _| {})
    }

    /// Like [`run`](Self::run), calling `progress(index, total, report)`
    /// after each episode completes.
    pub fn run_with_progress<F>(
        &self,
        grid: &ParamGrid,
        base: &BacktestConfig,
        source: &dyn TickSource,
        cancel: &AtomicBool,
        progress: F,
    ) -> Result<RankedTable, RunError>
    where
        F: Fn(usize, usize, &BacktestReport) + Send + Sync,
    {
        let configs = grid.generate_configs(base)?;
        let total = configs.len();
        let ticks = load_ticks(&base.backtest, source)?;
        let dataset = DatasetInfo::describe(source, &ticks);

        tracing::info!(points = total, ticks = ticks.len(), "starting sweep");

        let run_one = |(idx, config): (usize, &BacktestConfig)| -> Result<BacktestReport, RunError> {
            let report = execute(config, ticks.clone(), dataset.clone(), cancel)?;
            progress(idx, total, &report);
            Ok(report)
        };

        let reports: Vec<BacktestReport> = if self.parallel {
            configs
                .par_iter()
                .enumerate()
                .map(run_one)
                .collect::<Result<Vec<_>, RunError>>()?
        } else {
            configs
                .iter()
                .enumerate()
                .map(run_one)
                .collect::<Result<Vec<_>, RunError>>()?
        };

        Ok(RankedTable::from_reports(&base.backtest.symbol, dataset, &reports))
    }
}
