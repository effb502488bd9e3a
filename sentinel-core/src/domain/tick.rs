//! MarketTick — one row of aligned market + sentiment data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentiment reading attached to a tick.
///
/// `score` lies in [-1, 1] (bearish to bullish). `source` labels where the
/// reading came from (e.g. "fear_greed", "news").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub score: f64,
    pub source: String,
}

impl Sentiment {
    pub fn new(score: f64, source: impl Into<String>) -> Self {
        Self {
            score: score.clamp(-1.0, 1.0),
            source: source.into(),
        }
    }

    /// Short text for the classifier, e.g. `news sentiment +0.40`.
    pub fn note(&self) -> String {
        format!("{} sentiment {:+.2}", self.source, self.score)
    }
}

/// OHLCV tick for the traded asset, optionally carrying a sentiment reading.
///
/// Ticks are produced by an external loader and consumed in strictly
/// increasing timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
}

impl MarketTick {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// The close is the reference price for fills and valuation, so it must
    /// be a positive finite number.
    pub fn has_tradable_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }

    pub fn sentiment_score(&self) -> Option<f64> {
        self.sentiment.as_ref().map(|s| s.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_tick() -> MarketTick {
        MarketTick {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 5_000.0,
            sentiment: Some(Sentiment::new(0.4, "news")),
        }
    }

    #[test]
    fn tick_is_tradable() {
        assert!(sample_tick().has_tradable_close());
        assert!(!sample_tick().is_void());
    }

    #[test]
    fn tick_detects_bad_close() {
        let mut tick = sample_tick();
        tick.close = 0.0;
        assert!(!tick.has_tradable_close());
        tick.close = f64::NAN;
        assert!(tick.is_void());
        assert!(!tick.has_tradable_close());
    }

    #[test]
    fn sentiment_note_names_source() {
        assert_eq!(Sentiment::new(0.4, "news").note(), "news sentiment +0.40");
        assert_eq!(Sentiment::new(-2.0, "fear_greed").note(), "fear_greed sentiment -1.00");
    }

    #[test]
    fn sentiment_is_clamped() {
        assert_eq!(Sentiment::new(3.0, "x").score, 1.0);
        assert_eq!(Sentiment::new(-1.5, "x").score, -1.0);
    }

    #[test]
    fn tick_without_sentiment_deserializes() {
        let json = r#"{"timestamp":"2024-01-02T00:00:00Z","open":1.0,"high":1.0,"low":1.0,"close":1.0,"volume":10.0}"#;
        let tick: MarketTick = serde_json::from_str(json).unwrap();
        assert!(tick.sentiment.is_none());
        assert_eq!(tick.sentiment_score(), None);
    }
}
