//! Intelligence agent — periodic slow-path reads with an SMA-deviation fallback.
//!
//! Every `consult_interval` decisions the agent asks the slow path for a
//! directional read and keeps it until the next consultation. A failed
//! consultation is answered by the offline model instead.
//!
//! - Bullish read (sentiment > threshold, confidence > minimum): BUY when flat.
//! - Bearish read: SELL when holding.
//! - Neutral read: BUY below SMA by `deviation_pct` when flat, SELL above it
//!   when holding.

use super::{Decision, DecisionProtocol};
use crate::config::{AgentConfig, ConfigError};
use crate::domain::Action;
use crate::engine::Observation;
use crate::indicators::{Indicator, Sma};
use crate::intelligence::{IntelRequest, IntelResponse, IntelligenceService, OfflineIntelligence, SlowPath};

/// Ticks in the return that feeds each consultation.
const RETURN_LOOKBACK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Read {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug)]
pub struct IntelligenceAgent {
    config: AgentConfig,
    asset: String,
    sma: Sma,
    slow_path: SlowPath,
    decisions: usize,
    last_read: Option<(Read, IntelResponse)>,
}

impl IntelligenceAgent {
    pub fn new(config: AgentConfig, slow_path: SlowPath, asset: impl Into<String>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sma: Sma::new(config.sma_period),
            asset: asset.into(),
            slow_path,
            decisions: 0,
            last_read: None,
            config,
        })
    }

    fn request(&self, observation: &Observation) -> IntelRequest {
        let closes = observation.closes();
        let volumes = observation.volumes();
        let n = closes.len();
        let lookback = RETURN_LOOKBACK.min(n.saturating_sub(1));
        let base = closes[n - 1 - lookback];
        let price_delta_pct = if base > 0.0 { (closes[n - 1] - base) / base } else { 0.0 };

        let avg_volume = volumes.iter().sum::<f64>() / n as f64;
        let volume_ratio = if avg_volume > 0.0 { volumes[n - 1] / avg_volume } else { 1.0 };

        IntelRequest {
            asset: self.asset.clone(),
            price_delta_pct,
            volume_ratio,
            sentiment: observation.sentiment_score(),
            news: observation.sentiment_note(),
        }
    }

    fn consult(&mut self, observation: &Observation) -> IntelResponse {
        let request = self.request(observation);
        match self.slow_path.consult(&request) {
            Ok(response) => response,
            Err(_) => match OfflineIntelligence.classify(&request) {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(error = %err, "offline model rejected request");
                    IntelResponse {
                        manipulation_probability: 0.0,
                        sentiment_score: 0.0,
                        confidence: 0.0,
                        rationale: "no read".into(),
                    }
                }
            },
        }
    }

    fn classify(&self, response: &IntelResponse) -> Read {
        let confident = response.confidence > self.config.min_confidence;
        if confident && response.sentiment_score > self.config.signal_threshold {
            Read::Bullish
        } else if confident && response.sentiment_score < -self.config.signal_threshold {
            Read::Bearish
        } else {
            Read::Neutral
        }
    }

    fn deviation_decision(&self, observation: &Observation) -> Decision {
        let price = observation.current_price();
        let Some(sma) = self.sma.latest(&observation.closes()) else {
            return Decision::hold("agent: neutral, SMA warming up");
        };
        let holding = observation.has_position();
        if !holding && price < sma * (1.0 - self.config.deviation_pct) {
            Decision::new(
                Action::Buy,
                format!("agent: neutral, price {price:.4} below SMA {sma:.4}"),
            )
        } else if holding && price > sma * (1.0 + self.config.deviation_pct) {
            Decision::new(
                Action::Sell,
                format!("agent: neutral, price {price:.4} above SMA {sma:.4}"),
            )
        } else {
            Decision::hold("agent: neutral, inside SMA band")
        }
    }
}

impl DecisionProtocol for IntelligenceAgent {
    fn name(&self) -> &str {
        "agent"
    }

    fn decide(&mut self, observation: &Observation) -> Decision {
        if self.decisions % self.config.consult_interval == 0 || self.last_read.is_none() {
            let response = self.consult(observation);
            let read = self.classify(&response);
            self.last_read = Some((read, response));
        }
        self.decisions += 1;

        let holding = observation.has_position();
        match &self.last_read {
            Some((Read::Bullish, r)) if !holding => Decision::new(
                Action::Buy,
                format!("agent: bullish read ({:.2}, conf {:.2})", r.sentiment_score, r.confidence),
            ),
            Some((Read::Bearish, r)) if holding => Decision::new(
                Action::Sell,
                format!("agent: bearish read ({:.2}, conf {:.2})", r.sentiment_score, r.confidence),
            ),
            Some((Read::Neutral, _)) | None => self.deviation_decision(observation),
            Some(_) => Decision::hold("agent: read already acted on"),
        }
    }

    fn reset(&mut self) {
        self.decisions = 0;
        self.last_read = None;
        self.slow_path.reset();
    }
}
