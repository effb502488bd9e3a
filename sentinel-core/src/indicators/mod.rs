//! Indicators over a window of closes.
//!
//! Indicators are pure functions: close series in, same-length numeric series
//! out. Protocols recompute them over each observation window, so a value at
//! index t never depends on ticks after t.

pub mod rsi;
pub mod sma;

pub use rsi::Rsi;
pub use sma::Sma;

/// Single-series indicator over close prices.
///
/// The first `lookback()` values of `compute` are `f64::NAN` (warmup).
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of values needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the whole series.
    fn compute(&self, closes: &[f64]) -> Vec<f64>;

    /// Most recent value, `None` during warmup or on NaN input.
    fn latest(&self, closes: &[f64]) -> Option<f64> {
        self.compute(closes).last().copied().filter(|v| !v.is_nan())
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
