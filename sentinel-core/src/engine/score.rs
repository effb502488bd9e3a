//! Reward shaping and the bounded episode score.
//!
//! Reward is the fractional change in net worth between consecutive steps.
//! Holding idle cash costs a fixed fraction of that cash every step; the
//! penalty reaches the score twice: once through the lower net worth and
//! once through the explicit penalty term.

use super::ledger::Ledger;
use crate::config::{ConfigError, ScoreConfig, MAX_SCORE};
use crate::domain::Action;

/// Per-step outcome of the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub reward: f64,
    /// Cash actually charged for holding (0 unless the action was HOLD).
    pub hold_penalty: f64,
    pub net_worth: f64,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct ScoreTracker {
    config: ScoreConfig,
    initial_capital: f64,
    previous_net_worth: f64,
    score: f64,
}

impl ScoreTracker {
    pub fn new(config: ScoreConfig, initial_capital: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            initial_capital,
            previous_net_worth: initial_capital,
            score: MAX_SCORE,
        })
    }

    pub fn reset(&mut self) {
        self.previous_net_worth = self.initial_capital;
        self.score = MAX_SCORE;
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn previous_net_worth(&self) -> f64 {
        self.previous_net_worth
    }

    /// Settle a step after the ledger applied `action` at `price`.
    ///
    /// HOLD leaves cash untouched, so the ledger's cash at this point is
    /// still the previous step's cash.
    pub fn settle(&mut self, ledger: &mut Ledger, action: Action, price: f64) -> Settlement {
        let hold_penalty = if action == Action::Hold && ledger.cash() > 0.0 {
            ledger.charge(ledger.cash() * self.config.hold_penalty_rate)
        } else {
            0.0
        };

        let net_worth = ledger.mark_to_market(price);
        let reward = if self.previous_net_worth == 0.0 {
            0.0
        } else {
            (net_worth - self.previous_net_worth) / self.previous_net_worth
        };

        self.apply_reward(reward, hold_penalty);
        self.previous_net_worth = net_worth;

        Settlement {
            reward,
            hold_penalty,
            net_worth,
            score: self.score,
        }
    }

    fn apply_reward(&mut self, reward: f64, penalty: f64) {
        if reward > 0.0 {
            self.score += reward * self.config.gain_multiplier;
        } else if reward < 0.0 {
            self.score += reward * self.config.loss_multiplier;
        }
        if penalty > 0.0 && self.initial_capital > 0.0 {
            self.score -= (penalty / self.initial_capital) * self.config.penalty_multiplier;
        }
        self.score = self.score.clamp(0.0, MAX_SCORE);
    }
}
