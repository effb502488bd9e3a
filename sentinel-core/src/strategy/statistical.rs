//! Statistical protocol — SMA crossover gated by RSI, biased by sentiment.
//!
//! The crossover is measured as the relative spread `(fast - slow) / slow`.
//! Sentiment shifts the crossing threshold to `-sentiment * sentiment_weight`:
//! bullish sentiment lowers the bar for entries, bearish sentiment raises it.
//!
//! - BUY when flat, the spread crosses above the threshold and RSI < overbought.
//! - SELL when holding, the spread crosses below the threshold and RSI > oversold.
//!
//! Stateless over the observation: the previous spread is recomputed from the
//! window without its last tick, so the same observation always yields the
//! same decision.

use super::{Decision, DecisionProtocol};
use crate::config::{ConfigError, StatisticalConfig};
use crate::domain::Action;
use crate::engine::Observation;
use crate::indicators::{Indicator, Rsi, Sma};

/// Indicator readings behind one decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossoverReading {
    pub previous_spread: f64,
    pub spread: f64,
    pub threshold: f64,
    pub rsi: f64,
}

#[derive(Debug, Clone)]
pub struct StatisticalProtocol {
    config: StatisticalConfig,
    fast: Sma,
    slow: Sma,
    rsi: Rsi,
}

impl StatisticalProtocol {
    pub fn new(config: StatisticalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            fast: Sma::new(config.fast_period),
            slow: Sma::new(config.slow_period),
            rsi: Rsi::new(config.rsi_period),
            config,
        })
    }

    /// Indicator readings for `observation`, `None` while warming up.
    pub fn reading(&self, observation: &Observation) -> Option<CrossoverReading> {
        let closes = observation.closes();
        if closes.len() < self.config.required_window() {
            return None;
        }
        let n = closes.len();
        let fast = self.fast.compute(&closes);
        let slow = self.slow.compute(&closes);
        let rsi = self.rsi.latest(&closes)?;

        let spread_at = |i: usize| -> Option<f64> {
            let (f, s) = (fast[i], slow[i]);
            (f.is_finite() && s.is_finite() && s != 0.0).then(|| (f - s) / s)
        };
        let sentiment = observation.sentiment_score().unwrap_or(0.0);

        Some(CrossoverReading {
            previous_spread: spread_at(n - 2)?,
            spread: spread_at(n - 1)?,
            threshold: -sentiment * self.config.sentiment_weight,
            rsi,
        })
    }

    /// Decide without mutating anything.
    pub fn evaluate(&self, observation: &Observation) -> Decision {
        let Some(r) = self.reading(observation) else {
            return Decision::hold("statistical: warming up");
        };
        let crossed_up = r.previous_spread <= r.threshold && r.spread > r.threshold;
        let crossed_down = r.previous_spread >= r.threshold && r.spread < r.threshold;
        let holding = observation.has_position();

        if crossed_up && !holding && r.rsi < self.config.rsi_overbought {
            return Decision::new(
                Action::Buy,
                format!(
                    "statistical: spread {:+.4} crossed above {:+.4}, RSI {:.1}",
                    r.spread, r.threshold, r.rsi
                ),
            );
        }
        if crossed_down && holding && r.rsi > self.config.rsi_oversold {
            return Decision::new(
                Action::Sell,
                format!(
                    "statistical: spread {:+.4} crossed below {:+.4}, RSI {:.1}",
                    r.spread, r.threshold, r.rsi
                ),
            );
        }
        Decision::hold(format!(
            "statistical: no signal (spread {:+.4}, RSI {:.1})",
            r.spread, r.rsi
        ))
    }
}

impl DecisionProtocol for StatisticalProtocol {
    fn name(&self) -> &str {
        "statistical"
    }

    fn decide(&mut self, observation: &Observation) -> Decision {
        self.evaluate(observation)
    }

    fn reset(&mut self) {}
}
