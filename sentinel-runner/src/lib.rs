//! Sentinel Runner — backtest orchestration, comparison, sweeps, metrics.
//!
//! This crate builds on `sentinel-core` to provide:
//! - TOML backtest configs with content-hashed run ids
//! - Tick sources (CSV files, seeded synthetic series)
//! - The single-backtest runner with cooperative cancellation
//! - Performance metrics over an episode history
//! - Ranked strategy comparison and parameter sweeps on rayon

pub mod compare;
pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use compare::{compare, ranking_order, RankedEntry, RankedTable};
pub use config::{BacktestConfig, BacktestSpec, ConfigError, RunId};
pub use data_loader::{CsvTickSource, LoadError, SyntheticTickSource, TickSource};
pub use metrics::{MetricsError, PerformanceMetrics, ProfitFactor};
pub use runner::{run, run_backtest, BacktestReport, DatasetInfo, RunError};
pub use sweep::{ParamGrid, Sweep};

/// Tick source for a backtest: its CSV file when one is set, synthetic
/// ticks otherwise.
pub fn source_for(spec: &BacktestSpec) -> Box<dyn TickSource> {
    match &spec.data {
        Some(path) => Box::new(CsvTickSource::new(path.clone())),
        None => Box::new(SyntheticTickSource::new()),
    }
}
