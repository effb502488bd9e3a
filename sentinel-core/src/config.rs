//! Engine configuration — every numeric knob of a simulation, validated once.
//!
//! The configuration is an immutable value threaded through construction of
//! the ledger, score tracker, environment and decision protocols. Nothing in
//! the simulation loop reads module-level state, so independent episodes with
//! different configs can run side by side.
//!
//! Validation happens at load time (`EngineConfig::validate`), never deep in
//! the step loop. Constructors of individual components call the relevant
//! section's `validate` as well so that hand-built configs cannot bypass it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound (and reset value) of the episode score.
pub const MAX_SCORE: f64 = 1000.0;

/// Invalid numeric ranges or malformed configuration. Always fatal, raised
/// before any episode starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} = {value} is out of range (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Exchange, capital and episode settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub initial_capital: f64,
    /// Commission as a fraction of executed notional (0.001 = 0.1%).
    pub fee_rate: f64,
    /// Adverse price move applied to every fill (0.0005 = 0.05%).
    pub slippage_rate: f64,
    /// Fraction of available cash spent by each BUY.
    pub risk_per_trade: f64,
    /// BUYs whose cash budget falls below this are no-ops.
    pub min_trade_notional: f64,
    /// Number of ticks in the observation window.
    pub window_size: usize,
    /// Largest tolerated gap between consecutive ticks. `None` accepts any gap.
    pub max_gap_secs: Option<i64>,
    /// Terminate the episode as soon as the score reaches 0.
    pub halt_on_zero_score: bool,
    /// Annualization factor for the Sharpe ratio (365 for 24/7 daily data).
    pub periods_per_year: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100.0,
            fee_rate: 0.001,
            slippage_rate: 0.0005,
            risk_per_trade: 0.1,
            min_trade_notional: 0.01,
            window_size: 40,
            max_gap_secs: None,
            halt_on_zero_score: false,
            periods_per_year: 365.0,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("simulation.initial_capital", self.initial_capital)?;
        check_friction_rate("simulation.fee_rate", self.fee_rate)?;
        check_friction_rate("simulation.slippage_rate", self.slippage_rate)?;
        check_open_unit("simulation.risk_per_trade", self.risk_per_trade)?;
        check_non_negative("simulation.min_trade_notional", self.min_trade_notional)?;
        check_positive("simulation.periods_per_year", self.periods_per_year)?;
        if self.window_size < 2 {
            return Err(ConfigError::OutOfRange {
                field: "simulation.window_size",
                value: self.window_size as f64,
                expected: ">= 2",
            });
        }
        if let Some(gap) = self.max_gap_secs {
            if gap <= 0 {
                return Err(ConfigError::OutOfRange {
                    field: "simulation.max_gap_secs",
                    value: gap as f64,
                    expected: "> 0",
                });
            }
        }
        Ok(())
    }
}

/// Reward shaping and score multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreConfig {
    /// Fraction of idle cash charged on every HOLD.
    pub hold_penalty_rate: f64,
    pub gain_multiplier: f64,
    pub loss_multiplier: f64,
    pub penalty_multiplier: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            hold_penalty_rate: 0.05,
            gain_multiplier: 100.0,
            loss_multiplier: 150.0,
            penalty_multiplier: 50.0,
        }
    }
}

impl ScoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction_below_one("score.hold_penalty_rate", self.hold_penalty_rate)?;
        check_non_negative("score.gain_multiplier", self.gain_multiplier)?;
        check_non_negative("score.loss_multiplier", self.loss_multiplier)?;
        check_non_negative("score.penalty_multiplier", self.penalty_multiplier)?;
        Ok(())
    }
}

/// SMA crossover + RSI parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatisticalConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// Scales sentiment into a shift of the crossover threshold (relative spread units).
    pub sentiment_weight: f64,
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        Self {
            fast_period: 10,
            slow_period: 30,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            sentiment_weight: 0.01,
        }
    }
}

impl StatisticalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_period == 0 || self.rsi_period == 0 {
            return Err(ConfigError::Inconsistent(
                "statistical periods must be >= 1".into(),
            ));
        }
        if self.slow_period <= self.fast_period {
            return Err(ConfigError::Inconsistent(format!(
                "statistical.slow_period ({}) must be > fast_period ({})",
                self.slow_period, self.fast_period
            )));
        }
        check_within("statistical.rsi_overbought", self.rsi_overbought, 0.0, 100.0)?;
        check_within("statistical.rsi_oversold", self.rsi_oversold, 0.0, 100.0)?;
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(ConfigError::Inconsistent(
                "statistical.rsi_oversold must be below rsi_overbought".into(),
            ));
        }
        check_within("statistical.sentiment_weight", self.sentiment_weight, 0.0, 1.0)?;
        Ok(())
    }

    /// Ticks needed to evaluate both the current and the previous crossover state.
    pub fn required_window(&self) -> usize {
        (self.slow_period + 1).max(self.rsi_period + 1)
    }
}

/// Stop-loss / take-profit bands around the entry price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwingConfig {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.05,
            take_profit_pct: 0.10,
        }
    }
}

impl SwingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_open_unit("swing.stop_loss_pct", self.stop_loss_pct)?;
        check_positive("swing.take_profit_pct", self.take_profit_pct)?;
        Ok(())
    }
}

/// Anomaly detection thresholds and the contrarian position's exit rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContrarianConfig {
    /// Minimum absolute price move over `spike_lookback` ticks.
    pub spike_pct: f64,
    pub spike_lookback: usize,
    /// Current volume must be at least this multiple of the trailing average.
    pub volume_multiple: f64,
    /// Number of prior ticks in the trailing volume average.
    pub volume_lookback: usize,
    /// Manipulation probability above which the crowd is faded.
    pub manipulation_cutoff: f64,
    /// Force an exit after this many steps in the position.
    pub max_holding_steps: usize,
    pub stop_loss_pct: f64,
    pub take_profit_pct: Option<f64>,
}

impl Default for ContrarianConfig {
    fn default() -> Self {
        Self {
            spike_pct: 0.03,
            spike_lookback: 1,
            volume_multiple: 3.0,
            volume_lookback: 19,
            manipulation_cutoff: 0.7,
            max_holding_steps: 5,
            stop_loss_pct: 0.03,
            take_profit_pct: Some(0.03),
        }
    }
}

impl ContrarianConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_open_unit("contrarian.spike_pct", self.spike_pct)?;
        if self.spike_lookback == 0 || self.volume_lookback == 0 || self.max_holding_steps == 0 {
            return Err(ConfigError::Inconsistent(
                "contrarian lookbacks and max_holding_steps must be >= 1".into(),
            ));
        }
        if !(self.volume_multiple.is_finite() && self.volume_multiple >= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "contrarian.volume_multiple",
                value: self.volume_multiple,
                expected: ">= 1",
            });
        }
        check_within(
            "contrarian.manipulation_cutoff",
            self.manipulation_cutoff,
            0.0,
            1.0,
        )?;
        check_open_unit("contrarian.stop_loss_pct", self.stop_loss_pct)?;
        if let Some(tp) = self.take_profit_pct {
            check_positive("contrarian.take_profit_pct", tp)?;
        }
        Ok(())
    }
}

/// Slow-path consultation cadence for the intelligence agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub consult_interval: usize,
    pub sma_period: usize,
    /// Fast-path band around the SMA used when the read is neutral.
    pub deviation_pct: f64,
    /// |sentiment| above which a read is directional.
    pub signal_threshold: f64,
    pub min_confidence: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            consult_interval: 24,
            sma_period: 10,
            deviation_pct: 0.03,
            signal_threshold: 0.2,
            min_confidence: 0.5,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.consult_interval == 0 || self.sma_period == 0 {
            return Err(ConfigError::Inconsistent(
                "agent.consult_interval and agent.sma_period must be >= 1".into(),
            ));
        }
        check_open_unit("agent.deviation_pct", self.deviation_pct)?;
        check_within("agent.signal_threshold", self.signal_threshold, 0.0, 1.0)?;
        check_within("agent.min_confidence", self.min_confidence, 0.0, 1.0)?;
        Ok(())
    }
}

/// External intelligence service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntelligenceConfig {
    /// HTTP endpoint. `None` uses the local offline model.
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    /// Consecutive failures before the slow path is skipped.
    pub failure_threshold: u32,
    /// Consultations skipped once the breaker opens.
    pub cooldown_calls: u32,
}

impl Default for IntelligenceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 800,
            failure_threshold: 3,
            cooldown_calls: 10,
        }
    }
}

impl IntelligenceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=30_000).contains(&self.timeout_ms) {
            return Err(ConfigError::OutOfRange {
                field: "intelligence.timeout_ms",
                value: self.timeout_ms as f64,
                expected: "1..=30000",
            });
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::OutOfRange {
                field: "intelligence.failure_threshold",
                value: 0.0,
                expected: ">= 1",
            });
        }
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::Malformed(format!(
                    "intelligence.endpoint must be an http(s) URL, got '{endpoint}'"
                )));
            }
        }
        Ok(())
    }
}

/// Complete immutable configuration of an episode and its strategies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub simulation: SimulationConfig,
    pub score: ScoreConfig,
    pub statistical: StatisticalConfig,
    pub swing: SwingConfig,
    pub contrarian: ContrarianConfig,
    pub agent: AgentConfig,
    pub intelligence: IntelligenceConfig,
}

impl EngineConfig {
    /// Validate every section plus the cross-section constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.score.validate()?;
        self.statistical.validate()?;
        self.swing.validate()?;
        self.contrarian.validate()?;
        self.agent.validate()?;
        self.intelligence.validate()?;

        let needed = self.statistical.required_window();
        if self.simulation.window_size < needed {
            return Err(ConfigError::Inconsistent(format!(
                "simulation.window_size ({}) must cover the statistical lookback ({needed})",
                self.simulation.window_size
            )));
        }
        if self.simulation.window_size < self.contrarian.spike_lookback + 1 {
            return Err(ConfigError::Inconsistent(
                "simulation.window_size must exceed contrarian.spike_lookback".into(),
            ));
        }
        if self.simulation.window_size < self.agent.sma_period {
            return Err(ConfigError::Inconsistent(
                "simulation.window_size must cover agent.sma_period".into(),
            ));
        }
        Ok(())
    }

    /// Validated copy, for callers that build configs by hand.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }
}

// ─── Range checks ───────────────────────────────────────────────────

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "> 0",
        })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: ">= 0",
        })
    }
}

/// Rates that may be zero, such as the hold penalty: `[0, 1)`.
fn check_fraction_below_one(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "[0, 1)",
        })
    }
}

/// Fee and slippage rates: `(0, 1)`. A zero rate would make a round trip free.
fn check_friction_rate(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "(0, 1)",
        })
    }
}

/// Fractions that must be strictly positive: `(0, 1]`.
fn check_open_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "(0, 1]",
        })
    }
}

fn check_within(field: &'static str, value: f64, lo: f64, hi: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "within the documented bounds",
        })
    }
}
