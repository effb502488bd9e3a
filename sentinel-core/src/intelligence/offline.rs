//! Offline intelligence model — a deterministic local stand-in for the
//! external classifier, computed from the request fields alone.

use super::{ExternalServiceError, IntelRequest, IntelResponse, IntelligenceService};

/// |combined| below this reads as neutral.
const NEUTRAL_BAND: f64 = 0.2;
const NEUTRAL_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineIntelligence;

impl OfflineIntelligence {
    pub fn new() -> Self {
        Self
    }
}

impl IntelligenceService for OfflineIntelligence {
    fn name(&self) -> &str {
        "offline"
    }

    fn classify(&self, request: &IntelRequest) -> Result<IntelResponse, ExternalServiceError> {
        let sentiment = request.sentiment.unwrap_or(0.0).clamp(-1.0, 1.0);
        let direction = if request.price_delta_pct > 0.0 {
            1.0
        } else if request.price_delta_pct < 0.0 {
            -1.0
        } else {
            0.0
        };

        // Volume surge alone saturates at 0.6; crowd sentiment agreeing with
        // the move adds up to 0.4 more.
        let vr = request.volume_ratio.max(0.0);
        let surge = ((vr - 1.0) / (vr + 1.0)).clamp(0.0, 1.0) * 0.6;
        let herd = if direction != 0.0 && sentiment.signum() == direction {
            0.4 * sentiment.abs()
        } else {
            0.0
        };
        let manipulation_probability = (surge + herd).clamp(0.0, 1.0);

        let combined = (sentiment * 0.6 + direction * 0.4).clamp(-1.0, 1.0);
        let (confidence, label) = if combined > NEUTRAL_BAND {
            ((0.5 + combined / 2.0).min(1.0), "bullish")
        } else if combined < -NEUTRAL_BAND {
            ((0.5 - combined / 2.0).min(1.0), "bearish")
        } else {
            (NEUTRAL_CONFIDENCE, "neutral")
        };

        IntelResponse {
            manipulation_probability,
            sentiment_score: combined,
            confidence,
            rationale: format!(
                "offline: {label} read on {} (move {:+.2}%, volume x{:.1})",
                request.asset,
                request.price_delta_pct * 100.0,
                vr
            ),
        }
        .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(delta: f64, vr: f64, sentiment: Option<f64>) -> IntelRequest {
        IntelRequest {
            asset: "BTC".into(),
            price_delta_pct: delta,
            volume_ratio: vr,
            sentiment,
            news: None,
        }
    }

    #[test]
    fn herd_pump_reads_as_manipulation() {
        let r = OfflineIntelligence
            .classify(&request(0.12, 8.0, Some(0.9)))
            .unwrap();
        // 7/9 * 0.6 + 0.4 * 0.9
        assert!((r.manipulation_probability - (7.0 / 9.0 * 0.6 + 0.36)).abs() < 1e-12);
        assert!(r.manipulation_probability > 0.7);
        assert!(r.sentiment_score > 0.2);
    }

    #[test]
    fn contrary_sentiment_lowers_probability() {
        let r = OfflineIntelligence
            .classify(&request(0.12, 8.0, Some(-0.9)))
            .unwrap();
        assert!(r.manipulation_probability < 0.5);
    }

    #[test]
    fn quiet_market_is_neutral() {
        let r = OfflineIntelligence.classify(&request(0.0, 1.0, None)).unwrap();
        assert_eq!(r.manipulation_probability, 0.0);
        assert_eq!(r.sentiment_score, 0.0);
        assert_eq!(r.confidence, NEUTRAL_CONFIDENCE);
    }

    #[test]
    fn deterministic() {
        let req = request(-0.05, 3.0, Some(-0.4));
        let a = OfflineIntelligence.classify(&req).unwrap();
        let b = OfflineIntelligence.classify(&req).unwrap();
        assert_eq!(a, b);
    }
}
