//! Simulation engine — cost model, ledger, score tracker and the episode
//! state machine that ties them together.
//!
//! One step per tick:
//!
//! 1. Apply the action at the tick's close through the ledger (cost model fills)
//! 2. Charge the HOLD penalty on idle cash
//! 3. Mark to market, compute reward, fold it into the score
//! 4. Append the step record, advance the cursor, check termination

pub mod cost_model;
pub mod environment;
pub mod error;
pub mod history;
pub mod ledger;
pub mod observation;
pub mod score;

pub use cost_model::{CostModel, Execution};
pub use environment::{validate_series, SimulationEnv, StepInfo, StepResult};
pub use error::{DataError, EngineError, EpisodeState};
pub use history::{EpisodeHistory, StepRecord, TerminationReason};
pub use ledger::{Ledger, LedgerOutcome};
pub use observation::Observation;
pub use score::{ScoreTracker, Settlement};
