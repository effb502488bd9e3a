//! TradeRecord — a closed round trip: entry lots → full liquidation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed long round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_step: usize,
    pub entry_timestamp: DateTime<Utc>,
    /// Volume-weighted execution price of all entry lots.
    pub entry_price: f64,

    // ── Exit ──
    pub exit_step: usize,
    pub exit_timestamp: DateTime<Utc>,
    pub exit_price: f64,

    // ── Size ──
    pub quantity: f64,

    // ── PnL ──
    /// Cash spent on entry, entry fees included.
    pub cost_basis: f64,
    /// Cash received on exit, exit fee already deducted.
    pub proceeds: f64,
    pub exit_fee: f64,
    pub net_pnl: f64,
}

impl TradeRecord {
    /// Return on the trade as a fraction of the cost basis.
    pub fn return_pct(&self) -> f64 {
        if self.cost_basis <= 0.0 {
            return 0.0;
        }
        self.net_pnl / self.cost_basis
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn steps_held(&self) -> usize {
        self.exit_step.saturating_sub(self.entry_step)
    }
}
