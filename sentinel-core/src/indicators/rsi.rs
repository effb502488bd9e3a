//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0; flat → 50.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    /// # Panics
    /// If `period` is 0. Periods come from validated configs.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        let changes: Vec<f64> = std::iter::once(f64::NAN)
            .chain(closes.windows(2).map(|w| w[1] - w[0]))
            .collect();

        // Seed with simple averages over the first `period` changes.
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for &ch in &changes[1..=self.period] {
            if ch.is_nan() {
                return result;
            }
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;
        result[self.period] = compute_rsi(avg_gain, avg_loss);

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..n {
            let ch = changes[i];
            if ch.is_nan() {
                return result;
            }
            avg_gain = alpha * ch.max(0.0) + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * (-ch).max(0.0) + (1.0 - alpha) * avg_loss;
            result[i] = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains() {
        let result = Rsi::new(3).compute(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        assert_approx(result[3], 100.0, 1e-6);
    }

    #[test]
    fn rsi_all_losses() {
        let result = Rsi::new(3).compute(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        assert_approx(result[3], 0.0, 1e-6);
    }

    #[test]
    fn rsi_flat_is_neutral() {
        let result = Rsi::new(3).compute(&[100.0; 6]);
        assert_approx(result[5], 50.0, 1e-12);
    }

    #[test]
    fn rsi_mixed_seed() {
        // Changes: +0.34, -0.25, -0.48 → 100 - 100/(1 + 0.34/0.73)
        let result = Rsi::new(3).compute(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        assert!(result[..3].iter().all(|v| v.is_nan()));
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let result = Rsi::new(3).compute(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        for v in result.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn rsi_nan_in_seed() {
        let result = Rsi::new(3).compute(&[100.0, 101.0, f64::NAN, 103.0, 104.0]);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
