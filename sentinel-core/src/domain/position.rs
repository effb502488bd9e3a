use serde::{Deserialize, Serialize};

/// Quantities at or below this are treated as flat.
pub const QUANTITY_EPSILON: f64 = 1e-12;

/// Long-only position in the traded asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: f64,
    /// Volume-weighted execution price of the open lots (slippage included).
    pub entry_price: f64,
    /// Cash spent opening the position, fees included.
    pub cost_basis: f64,
    /// Step at which the position was first opened.
    pub opened_at_step: Option<usize>,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.quantity <= QUANTITY_EPSILON
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        if self.is_flat() {
            return 0.0;
        }
        self.market_value(price) - self.cost_basis
    }

    /// Add a lot to the position, updating the weighted entry price.
    pub fn add(&mut self, quantity: f64, price: f64, cash_spent: f64, step: usize) {
        let total = self.quantity + quantity;
        if total > 0.0 {
            self.entry_price = (self.entry_price * self.quantity + price * quantity) / total;
        }
        self.quantity = total;
        self.cost_basis += cash_spent;
        self.opened_at_step.get_or_insert(step);
    }

    /// Snapshot of what a decision protocol may see.
    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            quantity: self.quantity,
            entry_price: (!self.is_flat()).then_some(self.entry_price),
        }
    }
}

/// Read-only view of the position exposed in observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub quantity: f64,
    pub entry_price: Option<f64>,
}

impl PositionSnapshot {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn long(quantity: f64, entry_price: f64) -> Self {
        Self {
            quantity,
            entry_price: Some(entry_price),
        }
    }

    pub fn is_open(&self) -> bool {
        self.quantity > QUANTITY_EPSILON
    }
}
