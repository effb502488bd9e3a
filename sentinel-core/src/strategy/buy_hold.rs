//! Buy & Hold baseline — BUY on the first decision, HOLD afterwards.

use super::{Decision, DecisionProtocol};
use crate::domain::Action;
use crate::engine::Observation;

#[derive(Debug, Clone, Default)]
pub struct BuyAndHold {
    bought: bool,
}

impl BuyAndHold {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecisionProtocol for BuyAndHold {
    fn name(&self) -> &str {
        "buy_hold"
    }

    fn decide(&mut self, _observation: &Observation) -> Decision {
        if self.bought {
            Decision::hold("buy & hold: holding")
        } else {
            self.bought = true;
            Decision::new(Action::Buy, "buy & hold: initial entry")
        }
    }

    fn reset(&mut self) {
        self.bought = false;
    }
}
