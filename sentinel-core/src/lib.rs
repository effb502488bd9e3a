//! Sentinel Core — simulation environment, cost model, scoring and decision protocols.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (ticks, actions, positions, fills, trades)
//! - Validated, immutable engine configuration
//! - Cost model and portfolio ledger
//! - Reward shaping and the bounded episode score
//! - Reset/step episode state machine with an append-only history
//! - Decision protocols (statistical, swing, contrarian, buy & hold, agent)
//! - Slow-path intelligence service with timeout, breaker and offline model

pub mod config;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod intelligence;
pub mod strategy;

pub use config::{ConfigError, EngineConfig};
pub use domain::{Action, MarketTick};
pub use engine::{EpisodeHistory, Observation, SimulationEnv};
pub use strategy::{create_protocol, Decision, DecisionProtocol, StrategyKind};
