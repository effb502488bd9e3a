//! Observation — the read-only view handed to decision protocols.

use crate::domain::{MarketTick, PositionSnapshot, Sentiment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Index of the tick the next action will be applied to.
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    /// Fixed-length OHLCV window ending at (and including) the current tick.
    pub window: Vec<MarketTick>,
    pub position: PositionSnapshot,
    pub cash: f64,
    pub net_worth: f64,
    pub sentiment: Option<Sentiment>,
    pub score: f64,
}

impl Observation {
    /// Build the window for `index`, left-padding with `series[0]` when the
    /// series has fewer than `window_size` ticks before `index`.
    pub(crate) fn window_for(series: &[MarketTick], index: usize, window_size: usize) -> Vec<MarketTick> {
        let end = index + 1;
        let start = end.saturating_sub(window_size);
        let available = end - start;
        let mut window = Vec::with_capacity(window_size);
        if available < window_size {
            let pad = &series[0];
            window.extend(std::iter::repeat(pad).take(window_size - available).cloned());
        }
        window.extend_from_slice(&series[start..end]);
        window
    }

    pub fn current(&self) -> Option<&MarketTick> {
        self.window.last()
    }

    pub fn current_price(&self) -> f64 {
        self.current().map_or(f64::NAN, |t| t.close)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.window.iter().map(|t| t.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.window.iter().map(|t| t.volume).collect()
    }

    pub fn sentiment_score(&self) -> Option<f64> {
        self.sentiment.as_ref().map(|s| s.score)
    }

    pub fn sentiment_note(&self) -> Option<String> {
        self.sentiment.as_ref().map(Sentiment::note)
    }

    pub fn has_position(&self) -> bool {
        self.position.is_open()
    }
}
