//! Portfolio ledger — the only place cash and position change.
//!
//! BUY spends a fixed fraction of available cash, SELL liquidates the whole
//! position. There are no partial fills and no shorting; cash can never go
//! negative because a BUY's total cost is exactly its budget.

use super::cost_model::CostModel;
use crate::config::{ConfigError, SimulationConfig};
use crate::domain::{Action, Fill, PortfolioState, Side, TradeRecord};
use chrono::{DateTime, Utc};

/// Result of applying one action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerOutcome {
    pub fill: Option<Fill>,
    /// Set when a SELL closed the round trip.
    pub closed_trade: Option<TradeRecord>,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    cost: CostModel,
    risk_per_trade: f64,
    min_trade_notional: f64,
    state: PortfolioState,
    entry_timestamp: Option<DateTime<Utc>>,
}

impl Ledger {
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cost: CostModel::new(config.fee_rate, config.slippage_rate)?,
            risk_per_trade: config.risk_per_trade,
            min_trade_notional: config.min_trade_notional,
            state: PortfolioState::new(config.initial_capital),
            entry_timestamp: None,
        })
    }

    /// Back to initial capital, flat.
    pub fn reset(&mut self) {
        self.state = PortfolioState::new(self.state.initial_capital);
        self.entry_timestamp = None;
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    pub fn cash(&self) -> f64 {
        self.state.cash
    }

    /// `cash + quantity * price`. Side-effect free.
    pub fn mark_to_market(&self, price: f64) -> f64 {
        self.state.net_worth(price)
    }

    /// Apply an action at `reference_price` (the tick's close).
    pub fn apply(
        &mut self,
        action: Action,
        reference_price: f64,
        step: usize,
        timestamp: DateTime<Utc>,
    ) -> LedgerOutcome {
        match action {
            Action::Hold => LedgerOutcome::default(),
            Action::Buy => LedgerOutcome {
                fill: self.buy(reference_price, step, timestamp),
                closed_trade: None,
            },
            Action::Sell => self.sell(reference_price, step, timestamp),
        }
    }

    /// Deduct a penalty from cash, clamped at what is available.
    /// Returns the amount actually charged.
    pub fn charge(&mut self, amount: f64) -> f64 {
        let charged = amount.max(0.0).min(self.state.cash);
        self.state.cash -= charged;
        self.state.total_hold_penalty += charged;
        charged
    }

    fn buy(&mut self, reference_price: f64, step: usize, timestamp: DateTime<Utc>) -> Option<Fill> {
        // Budget is at most cash, so this also covers cash below the minimum.
        let budget = self.state.cash * self.risk_per_trade;
        if budget < self.min_trade_notional || budget <= 0.0 {
            return None;
        }

        let exec = self.cost.buy_with_budget(reference_price, budget);
        self.state.cash -= budget;
        if self.state.cash < 0.0 {
            self.state.cash = 0.0;
        }
        self.state
            .position
            .add(exec.quantity, exec.price, budget, step);
        self.state.total_fees += exec.fee;
        self.state.total_slippage += exec.slippage;
        self.entry_timestamp.get_or_insert(timestamp);

        Some(Fill {
            step,
            timestamp,
            side: Side::Buy,
            reference_price,
            price: exec.price,
            quantity: exec.quantity,
            notional: exec.notional,
            fee: exec.fee,
            slippage: exec.slippage,
        })
    }

    fn sell(&mut self, reference_price: f64, step: usize, timestamp: DateTime<Utc>) -> LedgerOutcome {
        if self.state.position.is_flat() {
            return LedgerOutcome::default();
        }

        let position = std::mem::take(&mut self.state.position);
        let exec = self.cost.sell_quantity(reference_price, position.quantity);
        let proceeds = exec.net_proceeds();
        let net_pnl = proceeds - position.cost_basis;

        self.state.cash += proceeds;
        self.state.total_fees += exec.fee;
        self.state.total_slippage += exec.slippage;
        self.state.realized_pnl += net_pnl;

        let entry_timestamp = self.entry_timestamp.take().unwrap_or(timestamp);
        let trade = TradeRecord {
            entry_step: position.opened_at_step.unwrap_or(step),
            entry_timestamp,
            entry_price: position.entry_price,
            exit_step: step,
            exit_timestamp: timestamp,
            exit_price: exec.price,
            quantity: position.quantity,
            cost_basis: position.cost_basis,
            proceeds,
            exit_fee: exec.fee,
            net_pnl,
        };
        let fill = Fill {
            step,
            timestamp,
            side: Side::Sell,
            reference_price,
            price: exec.price,
            quantity: exec.quantity,
            notional: exec.notional,
            fee: exec.fee,
            slippage: exec.slippage,
        };

        LedgerOutcome {
            fill: Some(fill),
            closed_trade: Some(trade),
        }
    }
}
