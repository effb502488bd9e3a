//! Contrarian protocol — fade suspected pump/dump moves.
//!
//! Two-path router:
//!
//! 1. Exit guard: hard stop, optional take-profit, time exit.
//! 2. Fast path: a price move of at least `spike_pct` over `spike_lookback`
//!    ticks together with volume of at least `volume_multiple` times the
//!    trailing average is an anomaly.
//! 3. Slow path: on an anomaly with a sentiment reading, ask the intelligence
//!    service. A manipulation probability above the cutoff trades against
//!    the crowd: price up ⇒ SELL, price down ⇒ BUY.
//!
//! Anything else (no anomaly, no sentiment, low probability, slow-path
//! failure) yields the statistical decision on the same observation.
//! Long only: fading a pump while flat is a SELL the ledger ignores, and
//! that no-op is not charged the HOLD penalty.

use super::{Decision, DecisionProtocol, ExitGuard, StatisticalProtocol};
use crate::config::{ConfigError, ContrarianConfig, StatisticalConfig};
use crate::domain::{Action, Sentiment};
use crate::engine::Observation;
use crate::intelligence::{IntelRequest, SlowPath};

/// Fast-path measurements on the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyReading {
    /// Fractional price change over `spike_lookback` ticks.
    pub price_delta: f64,
    /// Current volume over the trailing average of the prior ticks.
    pub volume_ratio: f64,
    pub is_anomaly: bool,
}

#[derive(Debug)]
pub struct ContrarianProtocol {
    config: ContrarianConfig,
    asset: String,
    guard: ExitGuard,
    fallback: StatisticalProtocol,
    slow_path: SlowPath,
}

impl ContrarianProtocol {
    pub fn new(
        config: ContrarianConfig,
        statistical: StatisticalConfig,
        slow_path: SlowPath,
        asset: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            guard: ExitGuard::new(
                config.stop_loss_pct,
                config.take_profit_pct,
                Some(config.max_holding_steps),
            ),
            fallback: StatisticalProtocol::new(statistical)?,
            asset: asset.into(),
            slow_path,
            config,
        })
    }

    /// Price move and volume ratio on the current tick.
    pub fn anomaly(&self, observation: &Observation) -> AnomalyReading {
        let closes = observation.closes();
        let volumes = observation.volumes();
        let n = closes.len();
        if n < 2 {
            return AnomalyReading {
                price_delta: 0.0,
                volume_ratio: 0.0,
                is_anomaly: false,
            };
        }

        let lookback = self.config.spike_lookback.min(n - 1);
        let base = closes[n - 1 - lookback];
        let price_delta = if base > 0.0 {
            (closes[n - 1] - base) / base
        } else {
            0.0
        };

        let prior = self.config.volume_lookback.min(n - 1);
        let trailing = &volumes[n - 1 - prior..n - 1];
        let avg = trailing.iter().sum::<f64>() / prior as f64;
        let volume_ratio = if avg > 0.0 { volumes[n - 1] / avg } else { 0.0 };

        AnomalyReading {
            price_delta,
            volume_ratio,
            is_anomaly: price_delta.abs() >= self.config.spike_pct
                && volume_ratio >= self.config.volume_multiple,
        }
    }

    fn fade(&mut self, reading: AnomalyReading, sentiment: &Sentiment) -> Option<Decision> {
        let request = IntelRequest {
            asset: self.asset.clone(),
            price_delta_pct: reading.price_delta,
            volume_ratio: reading.volume_ratio,
            sentiment: Some(sentiment.score),
            news: Some(sentiment.note()),
        };
        let response = self.slow_path.consult(&request).ok()?;
        if response.manipulation_probability <= self.config.manipulation_cutoff {
            tracing::debug!(
                probability = response.manipulation_probability,
                "anomaly judged organic"
            );
            return None;
        }

        let action = if reading.price_delta > 0.0 {
            Action::Sell
        } else {
            Action::Buy
        };
        Some(Decision::new(
            action,
            format!(
                "contrarian: fading {:+.2}% move on x{:.1} volume, manipulation p={:.2} ({})",
                reading.price_delta * 100.0,
                reading.volume_ratio,
                response.manipulation_probability,
                response.rationale
            ),
        ))
    }
}

impl DecisionProtocol for ContrarianProtocol {
    fn name(&self) -> &str {
        "contrarian"
    }

    fn decide(&mut self, observation: &Observation) -> Decision {
        if let Some(exit) = self.guard.check(observation) {
            return exit;
        }

        let reading = self.anomaly(observation);
        if reading.is_anomaly {
            if let Some(sentiment) = &observation.sentiment {
                if let Some(decision) = self.fade(reading, sentiment) {
                    return decision;
                }
            }
        }
        self.fallback.evaluate(observation)
    }

    fn reset(&mut self) {
        self.guard.reset();
        self.slow_path.reset();
    }
}
