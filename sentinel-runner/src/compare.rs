//! Strategy comparison — several protocols over the same ticks, ranked.
//!
//! The series is loaded once; each strategy then runs as an isolated episode
//! on rayon. Ranking: Sharpe descending, then total return descending, then
//! the smaller drawdown magnitude.

use std::cmp::Ordering;
use std::sync::atomic::AtomicBool;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use sentinel_core::StrategyKind;

use crate::config::{BacktestConfig, RunId};
use crate::data_loader::TickSource;
use crate::metrics::PerformanceMetrics;
use crate::runner::{execute, load_ticks, BacktestReport, DatasetInfo, RunError};

/// One row of a ranked table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based.
    pub rank: usize,
    pub run_id: RunId,
    pub strategy: StrategyKind,
    pub hold_penalty_rate: f64,
    pub risk_per_trade: f64,
    pub metrics: PerformanceMetrics,
}

impl RankedEntry {
    fn from_report(report: &BacktestReport) -> Self {
        Self {
            rank: 0,
            run_id: report.run_id.clone(),
            strategy: report.strategy(),
            hold_penalty_rate: report.config.engine.score.hold_penalty_rate,
            risk_per_trade: report.config.engine.simulation.risk_per_trade,
            metrics: report.metrics.clone(),
        }
    }
}

/// Ranked results of several episodes over one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTable {
    pub symbol: String,
    pub dataset: DatasetInfo,
    pub entries: Vec<RankedEntry>,
}

impl RankedTable {
    pub fn from_reports(symbol: &str, dataset: DatasetInfo, reports: &[BacktestReport]) -> Self {
        let mut entries: Vec<RankedEntry> = reports.iter().map(RankedEntry::from_report).collect();
        entries.sort_by(|a, b| ranking_order(&a.metrics, &b.metrics));
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }
        Self {
            symbol: symbol.to_string(),
            dataset,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }

    pub fn top_n(&self, n: usize) -> &[RankedEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}

/// Ordering for ranked tables: better entries sort first.
pub fn ranking_order(a: &PerformanceMetrics, b: &PerformanceMetrics) -> Ordering {
    b.sharpe_ratio
        .total_cmp(&a.sharpe_ratio)
        .then_with(|| b.total_return_pct.total_cmp(&a.total_return_pct))
        .then_with(|| a.drawdown_magnitude().total_cmp(&b.drawdown_magnitude()))
}

/// Run every strategy in `strategies` on the ticks of `base` and rank them.
///
/// `base.backtest.strategy` is ignored; all other settings are shared.
pub fn compare(
    base: &BacktestConfig,
    strategies: &[StrategyKind],
    source: &dyn TickSource,
    cancel: &AtomicBool,
) -> Result<RankedTable, RunError> {
    let ticks = load_ticks(&base.backtest, source)?;
    let dataset = DatasetInfo::describe(source, &ticks);

    let configs: Vec<BacktestConfig> = strategies
        .iter()
        .map(|&strategy| {
            let mut config = base.clone();
            config.backtest.strategy = strategy;
            config
        })
        .collect();

    let reports = configs
        .par_iter()
        .map(|config| execute(config, ticks.clone(), dataset.clone(), cancel))
        .collect::<Result<Vec<_>, RunError>>()?;

    let table = RankedTable::from_reports(&base.backtest.symbol, dataset, &reports);
    if let Some(best) = table.best() {
        tracing::info!(
            strategies = table.len(),
            best = %best.strategy,
            sharpe = best.metrics.sharpe_ratio,
            "comparison complete"
        );
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(sharpe: f64, total_return_pct: f64, max_drawdown_pct: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            initial_capital: 100.0,
            final_net_worth: 100.0 * (1.0 + total_return_pct / 100.0),
            total_return_pct,
            sharpe_ratio: sharpe,
            max_drawdown_pct,
            max_drawdown_steps: 0,
            trade_count: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            profit_factor: crate::metrics::ProfitFactor::NoTrades,
            avg_win: 0.0,
            avg_loss: 0.0,
            total_fees: 0.0,
            total_slippage: 0.0,
            total_hold_penalty: 0.0,
            steps: 10,
            final_score: 1000.0,
        }
    }

    fn sorted(mut items: Vec<PerformanceMetrics>) -> Vec<PerformanceMetrics> {
        items.sort_by(ranking_order);
        items
    }

    #[test]
    fn higher_sharpe_first() {
        let out = sorted(vec![metrics(0.5, 50.0, -1.0), metrics(1.5, 1.0, -30.0)]);
        assert_eq!(out[0].sharpe_ratio, 1.5);
    }

    #[test]
    fn sharpe_tie_broken_by_return() {
        let out = sorted(vec![metrics(1.0, 5.0, -1.0), metrics(1.0, 9.0, -20.0)]);
        assert_eq!(out[0].total_return_pct, 9.0);
    }

    #[test]
    fn full_tie_broken_by_smaller_drawdown() {
        let out = sorted(vec![metrics(1.0, 5.0, -12.0), metrics(1.0, 5.0, -4.0)]);
        assert_eq!(out[0].max_drawdown_pct, -4.0);
    }
}
