use crate::domain::action::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Realized outcome of a BUY or SELL after slippage and commission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub reference_price: f64,
    pub price: f64,
    pub quantity: f64,
    /// `price * quantity`, before fees.
    pub notional: f64,
    pub fee: f64,
    /// Cost of slippage versus the reference price, in quote currency.
    pub slippage: f64,
}
