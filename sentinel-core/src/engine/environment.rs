//! Simulation environment — the reset/step state machine for one episode.
//!
//! ```text
//! Idle --reset--> Ready --step--> Running --step (data exhausted)--> Terminated
//!                   ^                |                                   |
//!                   +----- reset ----+------------- reset ---------------+
//! ```
//!
//! Each `step` applies the chosen action at the close of the tick under the
//! cursor, settles reward and score, appends to the history and advances the
//! cursor. The environment never resets itself.

use super::error::{DataError, EngineError, EpisodeState};
use super::history::{EpisodeHistory, StepRecord, TerminationReason};
use super::ledger::Ledger;
use super::observation::Observation;
use super::score::ScoreTracker;
use crate::config::{ConfigError, EngineConfig, SimulationConfig};
use crate::domain::{Action, Fill, MarketTick};
use chrono::{DateTime, Utc};

/// Diagnostics returned with every step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Index of the tick the action was applied to.
    pub step: usize,
    pub total_steps: usize,
    pub fill: Option<Fill>,
    pub hold_penalty: f64,
    pub net_worth: f64,
    pub score: f64,
    pub termination: Option<TerminationReason>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    pub info: StepInfo,
}

pub struct SimulationEnv {
    config: SimulationConfig,
    ledger: Ledger,
    tracker: ScoreTracker,
    series: Vec<MarketTick>,
    cursor: usize,
    state: EpisodeState,
    history: EpisodeHistory,
}

impl SimulationEnv {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let sim = config.simulation.clone();
        sim.validate()?;
        Ok(Self {
            ledger: Ledger::new(&sim)?,
            tracker: ScoreTracker::new(config.score.clone(), sim.initial_capital)?,
            history: EpisodeHistory::new(sim.initial_capital),
            config: sim,
            series: Vec::new(),
            cursor: 0,
            state: EpisodeState::Idle,
        })
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn score(&self) -> f64 {
        self.tracker.score()
    }

    /// Index of the next tick to be processed.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_steps(&self) -> usize {
        self.series.len()
    }

    /// Start a fresh episode over `series`.
    pub fn reset(&mut self, series: Vec<MarketTick>) -> Result<Observation, DataError> {
        validate_series(&series, self.config.max_gap_secs)?;

        if self.state == EpisodeState::Running {
            tracing::warn!(
                completed = self.cursor,
                total = self.series.len(),
                "discarding running episode on reset"
            );
        }

        self.ledger.reset();
        self.tracker.reset();
        self.history = EpisodeHistory::new(self.config.initial_capital);
        self.series = series;
        self.cursor = 0;
        self.state = EpisodeState::Ready;

        tracing::debug!(ticks = self.series.len(), "episode reset");
        Ok(self.observe(0))
    }

    pub fn step(&mut self, action: Action) -> Result<StepResult, EngineError> {
        self.advance(action, None)
    }

    /// Like [`step`](Self::step), recording the protocol's rationale.
    pub fn step_with_rationale(
        &mut self,
        action: Action,
        rationale: impl Into<String>,
    ) -> Result<StepResult, EngineError> {
        self.advance(action, Some(rationale.into()))
    }

    /// Read-only access to the history of a terminated episode.
    pub fn history(&self) -> Result<&EpisodeHistory, EngineError> {
        self.require_terminated("history")?;
        Ok(&self.history)
    }

    /// Release the history of a terminated episode.
    pub fn into_history(self) -> Result<EpisodeHistory, EngineError> {
        self.require_terminated("into_history")?;
        Ok(self.history)
    }

    fn require_terminated(&self, operation: &'static str) -> Result<(), EngineError> {
        if self.state == EpisodeState::Terminated {
            Ok(())
        } else {
            Err(EngineError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn advance(&mut self, action: Action, rationale: Option<String>) -> Result<StepResult, EngineError> {
        if !matches!(self.state, EpisodeState::Ready | EpisodeState::Running) {
            return Err(EngineError::InvalidState {
                operation: "step",
                state: self.state,
            });
        }

        let index = self.cursor;
        let (timestamp, close) = {
            let tick = &self.series[index];
            (tick.timestamp, tick.close)
        };

        let outcome = self.ledger.apply(action, close, index, timestamp);
        let settlement = self.tracker.settle(&mut self.ledger, action, close);

        let portfolio = self.ledger.state();
        self.history.steps.push(StepRecord {
            step: index,
            timestamp,
            action,
            close,
            fill_price: outcome.fill.as_ref().map(|f| f.price),
            cash: portfolio.cash,
            portfolio_value: settlement.net_worth,
            position_qty: portfolio.position.quantity,
            reward: settlement.reward,
            score: settlement.score,
            hold_penalty: settlement.hold_penalty,
            rationale,
        });
        if let Some(fill) = &outcome.fill {
            self.history.fills.push(fill.clone());
        }
        if let Some(trade) = outcome.closed_trade {
            tracing::debug!(
                entry = trade.entry_step,
                exit = trade.exit_step,
                pnl = trade.net_pnl,
                "trade closed"
            );
            self.history.trades.push(trade);
        }

        self.cursor += 1;
        let termination = if self.cursor >= self.series.len() {
            Some(TerminationReason::DataExhausted)
        } else if self.config.halt_on_zero_score && settlement.score <= 0.0 {
            Some(TerminationReason::ScoreDepleted)
        } else {
            None
        };

        if let Some(reason) = termination {
            self.state = EpisodeState::Terminated;
            self.history.termination = Some(reason);
            tracing::debug!(
                ?reason,
                steps = self.history.len(),
                net_worth = settlement.net_worth,
                score = settlement.score,
                "episode terminated"
            );
        } else {
            self.state = EpisodeState::Running;
        }

        let next = if termination.is_some() { index } else { self.cursor };
        let observation = self.observe(next);
        Ok(StepResult {
            observation,
            reward: settlement.reward,
            terminated: termination.is_some(),
            info: StepInfo {
                step: index,
                total_steps: self.series.len(),
                fill: outcome.fill,
                hold_penalty: settlement.hold_penalty,
                net_worth: settlement.net_worth,
                score: settlement.score,
                termination,
            },
        })
    }

    fn observe(&self, index: usize) -> Observation {
        let tick = &self.series[index];
        Observation {
            step: index,
            timestamp: tick.timestamp,
            window: Observation::window_for(&self.series, index, self.config.window_size),
            position: self.ledger.state().position.snapshot(),
            cash: self.ledger.cash(),
            net_worth: self.ledger.mark_to_market(tick.close),
            sentiment: tick.sentiment.clone(),
            score: self.tracker.score(),
        }
    }
}

/// Check that a series can drive an episode: non-empty, strictly increasing
/// timestamps, positive finite closes, and gaps within `max_gap_secs`.
pub fn validate_series(series: &[MarketTick], max_gap_secs: Option<i64>) -> Result<(), DataError> {
    if series.is_empty() {
        return Err(DataError::Empty);
    }
    let mut previous: Option<DateTime<Utc>> = None;
    for (index, tick) in series.iter().enumerate() {
        if !tick.has_tradable_close() {
            return Err(DataError::InvalidClose {
                index,
                close: tick.close,
            });
        }
        if let Some(prev) = previous {
            if tick.timestamp <= prev {
                return Err(DataError::NonMonotonic {
                    index,
                    previous: prev,
                    current: tick.timestamp,
                });
            }
            if let Some(max_gap_secs) = max_gap_secs {
                let gap_secs = (tick.timestamp - prev).num_seconds();
                if gap_secs > max_gap_secs {
                    return Err(DataError::GapTooLarge {
                        index,
                        gap_secs,
                        max_gap_secs,
                    });
                }
            }
        }
        previous = Some(tick.timestamp);
    }
    Ok(())
}
