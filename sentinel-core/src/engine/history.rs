//! EpisodeHistory — the append-only log of one episode.

use crate::domain::{Action, Fill, TradeRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    DataExhausted,
    ScoreDepleted,
}

/// State of the episode after one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub close: f64,
    /// Execution price when the action produced a fill.
    pub fill_price: Option<f64>,
    pub cash: f64,
    pub portfolio_value: f64,
    pub position_qty: f64,
    pub reward: f64,
    pub score: f64,
    pub hold_penalty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeHistory {
    pub initial_capital: f64,
    pub steps: Vec<StepRecord>,
    pub fills: Vec<Fill>,
    pub trades: Vec<TradeRecord>,
    pub termination: Option<TerminationReason>,
}

impl EpisodeHistory {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            steps: Vec::new(),
            fills: Vec::new(),
            trades: Vec::new(),
            termination: None,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Net worth series, starting with the initial capital.
    pub fn equity_curve(&self) -> Vec<f64> {
        std::iter::once(self.initial_capital)
            .chain(self.steps.iter().map(|s| s.portfolio_value))
            .collect()
    }

    pub fn final_net_worth(&self) -> f64 {
        self.steps
            .last()
            .map_or(self.initial_capital, |s| s.portfolio_value)
    }

    pub fn final_score(&self) -> Option<f64> {
        self.steps.last().map(|s| s.score)
    }

    pub fn total_fees(&self) -> f64 {
        self.fills.iter().map(|f| f.fee).sum()
    }

    pub fn total_slippage(&self) -> f64 {
        self.fills.iter().map(|f| f.slippage).sum()
    }

    pub fn total_hold_penalty(&self) -> f64 {
        self.steps.iter().map(|s| s.hold_penalty).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(step: usize, value: f64, penalty: f64) -> StepRecord {
        StepRecord {
            step,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1 + step as u32, 0, 0, 0).unwrap(),
            action: Action::Hold,
            close: 100.0,
            fill_price: None,
            cash: value,
            portfolio_value: value,
            position_qty: 0.0,
            reward: 0.0,
            score: 1000.0,
            hold_penalty: penalty,
            rationale: None,
        }
    }

    #[test]
    fn equity_curve_starts_at_initial_capital() {
        let mut h = EpisodeHistory::new(100.0);
        h.steps.push(record(0, 95.0, 5.0));
        h.steps.push(record(1, 90.25, 4.75));
        assert_eq!(h.equity_curve(), vec![100.0, 95.0, 90.25]);
        assert_eq!(h.final_net_worth(), 90.25);
        assert!((h.total_hold_penalty() - 9.75).abs() < 1e-12);
    }

    #[test]
    fn empty_history_reports_initial_capital() {
        let h = EpisodeHistory::new(250.0);
        assert!(h.is_empty());
        assert_eq!(h.final_net_worth(), 250.0);
        assert_eq!(h.final_score(), None);
    }
}
