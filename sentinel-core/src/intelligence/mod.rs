//! Slow-path intelligence: an external classifier consulted on anomalies.
//!
//! The `IntelligenceService` trait abstracts over the offline model and the
//! HTTP client so protocols can swap implementations and mock for tests.
//! Protocols never call a service directly; they go through [`SlowPath`],
//! which bounds the call with a timeout and a call-counted circuit breaker.

pub mod breaker;
pub mod http;
pub mod offline;
pub mod slow_path;

pub use breaker::CallBreaker;
pub use http::HttpIntelligenceService;
pub use offline::OfflineIntelligence;
pub use slow_path::SlowPath;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Context sent to the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelRequest {
    pub asset: String,
    /// Fractional price move that triggered the consultation (0.12 = +12%).
    pub price_delta_pct: f64,
    /// Current volume over the trailing average.
    pub volume_ratio: f64,
    pub sentiment: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news: Option<String>,
}

/// Classifier verdict. Every numeric field is range-checked on receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelResponse {
    /// Probability in [0, 1] that the move is coordinated manipulation.
    pub manipulation_probability: f64,
    /// Directional read in [-1, 1].
    pub sentiment_score: f64,
    /// Confidence in [0, 1].
    pub confidence: f64,
    #[serde(default)]
    pub rationale: String,
}

impl IntelResponse {
    /// Reject out-of-range or non-finite fields.
    pub fn validate(self) -> Result<Self, ExternalServiceError> {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_unit(self.manipulation_probability) {
            return Err(ExternalServiceError::Malformed(format!(
                "manipulation_probability {} outside [0, 1]",
                self.manipulation_probability
            )));
        }
        if !(self.sentiment_score.is_finite() && (-1.0..=1.0).contains(&self.sentiment_score)) {
            return Err(ExternalServiceError::Malformed(format!(
                "sentiment_score {} outside [-1, 1]",
                self.sentiment_score
            )));
        }
        if !in_unit(self.confidence) {
            return Err(ExternalServiceError::Malformed(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        Ok(self)
    }
}

/// Slow-path failures. Always recovered locally by falling back to the fast path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalServiceError {
    #[error("intelligence service timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("malformed intelligence response: {0}")]
    Malformed(String),

    #[error("rate limited by intelligence service")]
    RateLimited,

    #[error("intelligence service unavailable: {0}")]
    Unavailable(String),

    #[error("slow path skipped: circuit breaker open")]
    CircuitOpen,
}

/// Classifier behind the slow path.
pub trait IntelligenceService: Send + Sync {
    /// Human-readable name (e.g., "offline", "http").
    fn name(&self) -> &str;

    fn classify(&self, request: &IntelRequest) -> Result<IntelResponse, ExternalServiceError>;
}

impl fmt::Debug for dyn IntelligenceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntelligenceService({})", self.name())
    }
}
