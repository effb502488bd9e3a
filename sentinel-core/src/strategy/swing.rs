//! Swing protocol — statistical entries with a fixed stop-loss / take-profit band.

use super::{Decision, DecisionProtocol, ExitGuard, StatisticalProtocol};
use crate::config::{ConfigError, StatisticalConfig, SwingConfig};
use crate::engine::Observation;

#[derive(Debug, Clone)]
pub struct SwingProtocol {
    guard: ExitGuard,
    entries: StatisticalProtocol,
}

impl SwingProtocol {
    pub fn new(swing: SwingConfig, statistical: StatisticalConfig) -> Result<Self, ConfigError> {
        swing.validate()?;
        Ok(Self {
            guard: ExitGuard::new(swing.stop_loss_pct, Some(swing.take_profit_pct), None),
            entries: StatisticalProtocol::new(statistical)?,
        })
    }
}

impl DecisionProtocol for SwingProtocol {
    fn name(&self) -> &str {
        "swing"
    }

    fn decide(&mut self, observation: &Observation) -> Decision {
        if let Some(exit) = self.guard.check(observation) {
            return exit;
        }
        self.entries.evaluate(observation)
    }

    fn reset(&mut self) {
        self.guard.reset();
    }
}
