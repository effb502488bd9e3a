//! Simple Moving Average (SMA).
//!
//! Rolling mean of closes over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// # Panics
    /// If `period` is 0. Periods come from validated configs.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        let mut sum: f64 = closes[..self.period].iter().sum();
        result[self.period - 1] = sum / self.period as f64;

        for i in self.period..n {
            let leaving = closes[i - self.period];
            let entering = closes[i];
            if leaving.is_nan() || entering.is_nan() || sum.is_nan() {
                // Rolling sum is poisoned by NaN; rescan the window.
                sum = closes[(i + 1 - self.period)..=i].iter().sum();
            } else {
                sum = sum - leaving + entering;
            }
            result[i] = sum / self.period as f64;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let result = Sma::new(5).compute(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        assert_eq!(result.len(), 7);
        for v in &result[..4] {
            assert!(v.is_nan());
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let result = Sma::new(1).compute(&[100.0, 200.0, 300.0]);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_nan_propagation() {
        let result = Sma::new(3).compute(&[10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0]);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_latest() {
        let sma = Sma::new(2);
        assert_eq!(sma.latest(&[1.0]), None);
        assert_approx(sma.latest(&[1.0, 2.0, 4.0]).unwrap(), 3.0, DEFAULT_EPSILON);
        assert_eq!(sma.lookback(), 1);
    }
}
