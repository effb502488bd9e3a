//! Performance metrics computed from a finished episode.
//!
//! Every metric is a pure function of the `EpisodeHistory`. Numeric edge
//! cases (flat equity, no trades, no losing trades) produce explicit values
//! instead of NaN or infinity, so reports serialize cleanly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sentinel_core::domain::TradeRecord;
use sentinel_core::EpisodeHistory;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("episode has not terminated; metrics need a complete history")]
    Incomplete,
    #[error("episode recorded no steps")]
    Empty,
}

/// Gross profit over gross loss, with the undefined cases spelled out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProfitFactor {
    Ratio(f64),
    /// Winning trades but no losing ones.
    Unbounded,
    /// No closed trade with non-zero PnL.
    NoTrades,
}

impl ProfitFactor {
    pub fn value(&self) -> Option<f64> {
        match self {
            ProfitFactor::Ratio(v) => Some(*v),
            ProfitFactor::Unbounded => Some(f64::INFINITY),
            ProfitFactor::NoTrades => None,
        }
    }
}

impl std::fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfitFactor::Ratio(v) => write!(f, "{v:.2}"),
            ProfitFactor::Unbounded => write!(f, "inf"),
            ProfitFactor::NoTrades => write!(f, "n/a"),
        }
    }
}

/// Summary statistics for one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // ── Returns ──
    pub initial_capital: f64,
    pub final_net_worth: f64,
    /// Percent, e.g. 12.5 for +12.5 %.
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,

    // ── Risk ──
    /// Negative percent, e.g. -15.0 for a 15 % drawdown. Zero when the
    /// equity never fell below a running peak.
    pub max_drawdown_pct: f64,
    pub max_drawdown_steps: usize,

    // ── Trades ──
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Fraction of closed trades with positive PnL, 0 when none closed.
    pub win_rate: f64,
    pub profit_factor: ProfitFactor,
    pub avg_win: f64,
    pub avg_loss: f64,

    // ── Frictions ──
    pub total_fees: f64,
    pub total_slippage: f64,
    pub total_hold_penalty: f64,

    // ── Episode ──
    pub steps: usize,
    pub final_score: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a terminated episode.
    pub fn compute(history: &EpisodeHistory, periods_per_year: f64) -> Result<Self, MetricsError> {
        if history.termination.is_none() {
            return Err(MetricsError::Incomplete);
        }
        let final_score = history.final_score().ok_or(MetricsError::Empty)?;

        let equity = history.equity_curve();
        let final_net_worth = history.final_net_worth();
        let (max_drawdown_pct, max_drawdown_steps) = max_drawdown(&equity);
        let returns = step_returns(&equity);
        let trades = &history.trades;

        Ok(Self {
            initial_capital: history.initial_capital,
            final_net_worth,
            total_return_pct: total_return_pct(history.initial_capital, final_net_worth),
            sharpe_ratio: sharpe_ratio(&returns, periods_per_year),
            max_drawdown_pct,
            max_drawdown_steps,
            trade_count: trades.len(),
            winning_trades: trades.iter().filter(|t| t.is_winner()).count(),
            losing_trades: trades.iter().filter(|t| t.net_pnl < 0.0).count(),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            avg_win: avg_win(trades),
            avg_loss: avg_loss(trades),
            total_fees: history.total_fees(),
            total_slippage: history.total_slippage(),
            total_hold_penalty: history.total_hold_penalty(),
            steps: history.len(),
            final_score,
        })
    }

    /// Drawdown magnitude as a positive percent, for ranking.
    pub fn drawdown_magnitude(&self) -> f64 {
        self.max_drawdown_pct.abs()
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn total_return_pct(initial: f64, final_value: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_value - initial) / initial * 100.0
}

/// Annualized Sharpe ratio of per-step returns (risk-free rate 0).
///
/// Zero with fewer than two returns or when the returns have no variance.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) / std * periods_per_year.sqrt()
}

/// Deepest peak-to-trough decline and the steps from that peak to the trough.
///
/// The depth is a negative percent; `(0.0, 0)` when equity never declines.
pub fn max_drawdown(equity_curve: &[f64]) -> (f64, usize) {
    if equity_curve.len() < 2 {
        return (0.0, 0);
    }
    let mut peak = equity_curve[0];
    let mut peak_index = 0;
    let mut max_dd = 0.0_f64;
    let mut duration = 0;

    for (i, &value) in equity_curve.iter().enumerate() {
        if value >= peak {
            peak = value;
            peak_index = i;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
                duration = i - peak_index;
            }
        }
    }
    (-max_dd * 100.0, duration)
}

pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

pub fn profit_factor(trades: &[TradeRecord]) -> ProfitFactor {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl.abs())
        .sum();

    if gross_loss > 0.0 {
        ProfitFactor::Ratio(gross_profit / gross_loss)
    } else if gross_profit > 0.0 {
        ProfitFactor::Unbounded
    } else {
        ProfitFactor::NoTrades
    }
}

pub fn avg_win(trades: &[TradeRecord]) -> f64 {
    let wins: Vec<f64> = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .collect();
    mean_f64(&wins)
}

/// Mean PnL of losing trades (negative, or 0 when none lost).
pub fn avg_loss(trades: &[TradeRecord]) -> f64 {
    let losses: Vec<f64> = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl)
        .collect();
    mean_f64(&losses)
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Simple returns between consecutive equity points.
pub fn step_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
