//! PortfolioState — cash + the single long-only position.

use super::position::Position;
use serde::{Deserialize, Serialize};

/// Aggregate portfolio state for one episode.
///
/// The accounting identity must hold at every step:
/// `net_worth == cash + position.quantity * close`. Net worth is always
/// recomputed from these two terms, never carried forward incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Position,
    pub total_fees: f64,
    pub total_slippage: f64,
    pub total_hold_penalty: f64,
    pub realized_pnl: f64,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            initial_capital,
            position: Position::default(),
            total_fees: 0.0,
            total_slippage: 0.0,
            total_hold_penalty: 0.0,
            realized_pnl: 0.0,
        }
    }

    /// Net worth = cash + mark-to-market value of the position.
    pub fn net_worth(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }

    pub fn has_position(&self) -> bool {
        !self.position.is_flat()
    }
}
