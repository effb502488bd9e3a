//! Transaction cost model: directional slippage + proportional commission.

use crate::config::ConfigError;
use crate::domain::Side;
use serde::{Deserialize, Serialize};

/// Validated fee and slippage rates, as fractions (0.001 = 0.1%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    fee_rate: f64,
    slippage_rate: f64,
}

/// What a fill costs and yields, before any cash moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Execution {
    pub price: f64,
    pub quantity: f64,
    /// `price * quantity`.
    pub notional: f64,
    pub fee: f64,
    /// Slippage cost versus the reference price, in quote currency.
    pub slippage: f64,
}

impl Execution {
    /// Cash leaving the account on a BUY.
    pub fn total_cost(&self) -> f64 {
        self.notional + self.fee
    }

    /// Cash entering the account on a SELL.
    pub fn net_proceeds(&self) -> f64 {
        self.notional - self.fee
    }
}

impl CostModel {
    pub fn new(fee_rate: f64, slippage_rate: f64) -> Result<Self, ConfigError> {
        for (field, value) in [("fee_rate", fee_rate), ("slippage_rate", slippage_rate)] {
            if !(value.is_finite() && value > 0.0 && value < 1.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    expected: "(0, 1)",
                });
            }
        }
        Ok(Self {
            fee_rate,
            slippage_rate,
        })
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    pub fn slippage_rate(&self) -> f64 {
        self.slippage_rate
    }

    /// Directional slippage: buyers pay more, sellers receive less.
    pub fn execution_price(&self, side: Side, reference_price: f64) -> f64 {
        match side {
            Side::Buy => reference_price * (1.0 + self.slippage_rate),
            Side::Sell => reference_price * (1.0 - self.slippage_rate),
        }
    }

    /// Commission on an executed notional.
    pub fn fee(&self, notional: f64) -> f64 {
        notional * self.fee_rate
    }

    /// Size a BUY so that `notional + fee == budget`.
    pub fn buy_with_budget(&self, reference_price: f64, budget: f64) -> Execution {
        let price = self.execution_price(Side::Buy, reference_price);
        let notional = budget / (1.0 + self.fee_rate);
        let quantity = notional / price;
        Execution {
            price,
            quantity,
            notional,
            // Derived from the budget so the cash debit is exactly `budget`.
            fee: budget - notional,
            slippage: (price - reference_price) * quantity,
        }
    }

    /// Sell an exact quantity; the fee comes out of the proceeds.
    pub fn sell_quantity(&self, reference_price: f64, quantity: f64) -> Execution {
        let price = self.execution_price(Side::Sell, reference_price);
        let notional = price * quantity;
        Execution {
            price,
            quantity,
            notional,
            fee: self.fee(notional),
            slippage: (reference_price - price) * quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_pays_slippage_and_fee() {
        let cost = CostModel::new(0.001, 0.001).unwrap();
        let exec = cost.buy_with_budget(100.0, 50.0);
        assert!(exec.price > 100.0);
        assert!(exec.fee > 0.0);
        assert!(exec.slippage > 0.0);
        assert!(exec.quantity < 0.5);
    }

    #[test]
    fn round_trip_at_same_price_loses_frictions() {
        let cost = CostModel::new(0.001, 0.0005).unwrap();
        let buy = cost.buy_with_budget(100.0, 100.0);
        let sell = cost.sell_quantity(100.0, buy.quantity);
        assert!(sell.net_proceeds() < buy.total_cost());
    }

    #[test]
    fn buy_slippage_increases_price() {
        let cost = CostModel::new(0.0005, 0.001).unwrap();
        assert!((cost.execution_price(Side::Buy, 100.0) - 100.1).abs() < 1e-10);
    }

    #[test]
    fn sell_slippage_decreases_price() {
        let cost = CostModel::new(0.0005, 0.001).unwrap();
        assert!((cost.execution_price(Side::Sell, 100.0) - 99.9).abs() < 1e-10);
    }

    #[test]
    fn buy_spends_exact_budget() {
        let cost = CostModel::new(0.001, 0.0005).unwrap();
        let exec = cost.buy_with_budget(100.0, 100.0);
        assert_eq!(exec.total_cost(), 100.0);
        // 100 / 1.001 notional at 100.05
        assert!((exec.notional - 100.0 / 1.001).abs() < 1e-10);
        assert!((exec.quantity - (100.0 / 1.001) / 100.05).abs() < 1e-12);
        assert!((exec.fee - exec.notional * 0.001).abs() < 1e-10);
    }

    #[test]
    fn sell_fee_comes_out_of_proceeds() {
        let cost = CostModel::new(0.001, 0.0005).unwrap();
        let exec = cost.sell_quantity(100.0, 2.0);
        assert!((exec.price - 99.95).abs() < 1e-10);
        assert!((exec.notional - 199.9).abs() < 1e-10);
        assert!((exec.fee - 0.1999).abs() < 1e-10);
        assert!((exec.net_proceeds() - 199.7001).abs() < 1e-10);
        assert!((exec.slippage - 0.1).abs() < 1e-10);
    }

    #[test]
    fn invalid_rates_rejected() {
        assert!(CostModel::new(-0.001, 0.001).is_err());
        assert!(CostModel::new(0.001, 1.0).is_err());
        assert!(CostModel::new(f64::NAN, 0.001).is_err());
        assert!(CostModel::new(f64::INFINITY, 0.001).is_err());
        assert!(CostModel::new(0.0, 0.001).is_err());
        assert!(CostModel::new(0.001, 0.0).is_err());
        assert!(CostModel::new(0.001, 0.0005).is_ok());
    }
}
