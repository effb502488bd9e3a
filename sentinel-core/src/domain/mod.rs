//! Domain types for the SENTINEL simulation engine

pub mod action;
pub mod fill;
pub mod portfolio;
pub mod position;
pub mod tick;
pub mod trade;

pub use action::{Action, Side};
pub use fill::Fill;
pub use portfolio::PortfolioState;
pub use position::{Position, PositionSnapshot};
pub use tick::{MarketTick, Sentiment};
pub use trade::TradeRecord;
