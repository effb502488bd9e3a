//! Call-counted circuit breaker for the slow path.
//!
//! After `failure_threshold` consecutive failures the breaker opens and the
//! next `cooldown_calls` consultations are refused without touching the
//! service. Cooldown is measured in consultations rather than wall time so a
//! replay of the same series makes the same decisions.

/// State of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation: calls are allowed.
    Closed,
    /// Tripped: refuses calls until `remaining` reaches 0.
    Open { remaining: u32 },
}

#[derive(Debug, Clone)]
pub struct CallBreaker {
    state: BreakerState,
    consecutive_failures: u32,
    failure_threshold: u32,
    cooldown_calls: u32,
}

impl CallBreaker {
    pub fn new(failure_threshold: u32, cooldown_calls: u32) -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            failure_threshold: failure_threshold.max(1),
            cooldown_calls,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    /// Ask permission for one consultation. A refused call counts down the cooldown.
    pub fn try_acquire(&mut self) -> bool {
        match self.state {
            BreakerState::Closed => true,
            BreakerState::Open { remaining } if remaining == 0 => {
                // Half-open: allow one probe, a failure re-trips immediately.
                self.state = BreakerState::Closed;
                self.consecutive_failures = self.failure_threshold - 1;
                true
            }
            BreakerState::Open { remaining } => {
                self.state = BreakerState::Open {
                    remaining: remaining - 1,
                };
                false
            }
        }
    }

    /// Record a successful call; resets the failure counter.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Record a failure. Trips the breaker once the threshold is reached.
    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.failure_threshold {
            self.state = BreakerState::Open {
                remaining: self.cooldown_calls,
            };
        }
    }

    pub fn reset(&mut self) {
        self.state = BreakerState::Closed;
        self.consecutive_failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let mut cb = CallBreaker::new(3, 2);
        assert!(cb.try_acquire());
    }

    #[test]
    fn trips_after_threshold_failures() {
        let mut cb = CallBreaker::new(3, 2);
        cb.record_failure();
        cb.record_failure();
        assert!(cb.try_acquire());
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Open { remaining: 2 });
        assert!(!cb.try_acquire());
    }

    #[test]
    fn success_resets_counter() {
        let mut cb = CallBreaker::new(3, 2);
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(cb.try_acquire());
    }

    #[test]
    fn cooldown_counts_refused_calls() {
        let mut cb = CallBreaker::new(1, 2);
        cb.record_failure();
        assert!(!cb.try_acquire());
        assert!(!cb.try_acquire());
        // Probe allowed after two refusals.
        assert!(cb.try_acquire());
        cb.record_failure();
        assert!(!cb.try_acquire());
    }

    #[test]
    fn probe_success_closes_breaker() {
        let mut cb = CallBreaker::new(2, 0);
        cb.record_failure();
        cb.record_failure();
        assert!(cb.try_acquire());
        cb.record_success();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);
    }
}
