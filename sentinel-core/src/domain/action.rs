//! Discrete actions chosen once per tick, and the fill side they map to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action chosen by a decision protocol for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    #[default]
    Hold,
    Buy,
    Sell,
}

impl Action {
    /// The fill side this action trades on, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Action::Hold => None,
            Action::Buy => Some(Side::Buy),
            Action::Sell => Some(Side::Sell),
        }
    }

    /// The opposite trading action. HOLD has no opposite.
    pub fn inverse(self) -> Action {
        match self {
            Action::Hold => Action::Hold,
            Action::Buy => Action::Sell,
            Action::Sell => Action::Buy,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Hold => "HOLD",
            Action::Buy => "BUY",
            Action::Sell => "SELL",
        };
        f.write_str(s)
    }
}

/// Side of an executed fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}
