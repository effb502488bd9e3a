//! Factory — builds a boxed protocol from a strategy name and the engine config.

use super::{
    BuyAndHold, ContrarianProtocol, DecisionProtocol, IntelligenceAgent, StatisticalProtocol,
    SwingProtocol,
};
use crate::config::{ConfigError, EngineConfig};
use crate::intelligence::SlowPath;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Statistical,
    Swing,
    Contrarian,
    BuyHold,
    Agent,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Statistical,
        StrategyKind::Swing,
        StrategyKind::Contrarian,
        StrategyKind::BuyHold,
        StrategyKind::Agent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Statistical => "statistical",
            StrategyKind::Swing => "swing",
            StrategyKind::Contrarian => "contrarian",
            StrategyKind::BuyHold => "buy_hold",
            StrategyKind::Agent => "agent",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = FactoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "statistical" | "crossover" => Ok(StrategyKind::Statistical),
            "swing" => Ok(StrategyKind::Swing),
            "contrarian" => Ok(StrategyKind::Contrarian),
            "buy_hold" | "buyhold" | "buy_and_hold" => Ok(StrategyKind::BuyHold),
            "agent" | "intelligence" => Ok(StrategyKind::Agent),
            _ => Err(FactoryError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Create a fresh protocol for one episode.
pub fn create_protocol(
    kind: StrategyKind,
    config: &EngineConfig,
    asset: &str,
) -> Result<Box<dyn DecisionProtocol>, FactoryError> {
    let protocol: Box<dyn DecisionProtocol> = match kind {
        StrategyKind::Statistical => Box::new(StatisticalProtocol::new(config.statistical.clone())?),
        StrategyKind::Swing => Box::new(SwingProtocol::new(
            config.swing.clone(),
            config.statistical.clone(),
        )?),
        StrategyKind::Contrarian => Box::new(ContrarianProtocol::new(
            config.contrarian.clone(),
            config.statistical.clone(),
            SlowPath::from_config(&config.intelligence)?,
            asset,
        )?),
        StrategyKind::BuyHold => Box::new(BuyAndHold::new()),
        StrategyKind::Agent => Box::new(IntelligenceAgent::new(
            config.agent.clone(),
            SlowPath::from_config(&config.intelligence)?,
            asset,
        )?),
    };
    Ok(protocol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("statistical".parse::<StrategyKind>().unwrap(), StrategyKind::Statistical);
        assert_eq!("Buy-Hold".parse::<StrategyKind>().unwrap(), StrategyKind::BuyHold);
        assert_eq!(" agent ".parse::<StrategyKind>().unwrap(), StrategyKind::Agent);
        assert!(matches!(
            "momentum".parse::<StrategyKind>(),
            Err(FactoryError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn every_kind_builds_with_defaults() {
        let config = EngineConfig::default();
        for kind in StrategyKind::ALL {
            let p = create_protocol(kind, &config, "BTC").unwrap();
            assert_eq!(p.name(), kind.as_str());
        }
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
        }
    }
}
