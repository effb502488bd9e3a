//! Decision protocols — pluggable policies that turn an observation into an action.
//!
//! Each protocol owns its own state and is reset between episodes. Protocols
//! never touch the ledger; they only read the observation.

pub mod buy_hold;
pub mod contrarian;
pub mod exits;
pub mod factory;
pub mod intelligence_agent;
pub mod statistical;
pub mod swing;

pub use buy_hold::BuyAndHold;
pub use contrarian::ContrarianProtocol;
pub use exits::ExitGuard;
pub use factory::{create_protocol, FactoryError, StrategyKind};
pub use intelligence_agent::IntelligenceAgent;
pub use statistical::StatisticalProtocol;
pub use swing::SwingProtocol;

use crate::domain::Action;
use crate::engine::Observation;

/// An action plus the reason for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub rationale: String,
}

impl Decision {
    pub fn new(action: Action, rationale: impl Into<String>) -> Self {
        Self {
            action,
            rationale: rationale.into(),
        }
    }

    pub fn hold(rationale: impl Into<String>) -> Self {
        Self::new(Action::Hold, rationale)
    }
}

/// Trait implemented by every strategy.
pub trait DecisionProtocol: Send {
    /// Stable identifier (e.g., "statistical", "contrarian").
    fn name(&self) -> &str;

    fn decide(&mut self, observation: &Observation) -> Decision;

    /// Clear per-episode state.
    fn reset(&mut self);
}
