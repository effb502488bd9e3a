//! Exit guard — stop-loss, take-profit and max holding period around the
//! entry price reported in the observation.
//!
//! Long only: stop = entry * (1 - stop_pct), target = entry * (1 + take_profit_pct).

use super::Decision;
use crate::domain::Action;
use crate::engine::Observation;

#[derive(Debug, Clone)]
pub struct ExitGuard {
    pub stop_loss_pct: f64,
    pub take_profit_pct: Option<f64>,
    pub max_holding: Option<usize>,
    held_steps: usize,
}

impl ExitGuard {
    pub fn new(stop_loss_pct: f64, take_profit_pct: Option<f64>, max_holding: Option<usize>) -> Self {
        Self {
            stop_loss_pct,
            take_profit_pct,
            max_holding,
            held_steps: 0,
        }
    }

    /// Number of consecutive decisions made while in a position.
    pub fn held_steps(&self) -> usize {
        self.held_steps
    }

    /// SELL when an exit rule fires, `None` otherwise (or when flat).
    pub fn check(&mut self, observation: &Observation) -> Option<Decision> {
        let entry = match observation.position.entry_price {
            Some(entry) if observation.has_position() => entry,
            _ => {
                self.held_steps = 0;
                return None;
            }
        };
        self.held_steps += 1;
        let price = observation.current_price();

        let stop = entry * (1.0 - self.stop_loss_pct);
        if price <= stop {
            return Some(self.exit(format!(
                "stop-loss: price {price:.4} <= stop {stop:.4} (entry {entry:.4})"
            )));
        }
        if let Some(tp) = self.take_profit_pct {
            let target = entry * (1.0 + tp);
            if price >= target {
                return Some(self.exit(format!(
                    "take-profit: price {price:.4} >= target {target:.4} (entry {entry:.4})"
                )));
            }
        }
        if let Some(max) = self.max_holding {
            if self.held_steps >= max {
                return Some(self.exit(format!("time exit after {} steps", self.held_steps)));
            }
        }
        None
    }

    pub fn reset(&mut self) {
        self.held_steps = 0;
    }

    fn exit(&mut self, rationale: String) -> Decision {
        self.held_steps = 0;
        Decision::new(Action::Sell, rationale)
    }
}
