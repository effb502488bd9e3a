//! Integration tests for the episode state machine.
//!
//! Tests:
//! 1. HOLD penalty: exact cash decay, strictly decreasing score, floor at 0
//! 2. Accounting: net worth == cash + quantity * close at every step
//! 3. Round trips: BUY then SELL at an unchanged price loses money, zero
//!    frictions are refused, a flat SELL is a free no-op
//! 4. Buy & Hold end to end on a rising series
//! 5. History: rationale capture, fills and trades released after termination

use chrono::{Duration, TimeZone, Utc};
use sentinel_core::config::EngineConfig;
use sentinel_core::domain::{Action, MarketTick, Side};
use sentinel_core::engine::{EngineError, EpisodeState, SimulationEnv, TerminationReason};
use sentinel_core::strategy::{BuyAndHold, DecisionProtocol};

/// Helper: one tick per day with the given closes.
fn ticks(closes: &[f64]) -> Vec<MarketTick> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| MarketTick {
            timestamp: base + Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 10_000.0,
            sentiment: None,
        })
        .collect()
}

fn env_with(config: &EngineConfig) -> SimulationEnv {
    SimulationEnv::new(config).unwrap()
}

// ──────────────────────────────────────────────
// 1. HOLD penalty
// ──────────────────────────────────────────────

#[test]
fn hold_only_cash_decays_by_exact_rate() {
    let config = EngineConfig::default();
    let rate = config.score.hold_penalty_rate;
    let mut env = env_with(&config);
    env.reset(ticks(&[100.0; 20])).unwrap();

    let mut previous_cash = 100.0;
    let mut previous_score = 1000.0;
    loop {
        let r = env.step(Action::Hold).unwrap();
        let cash = r.observation.cash;
        assert_eq!(r.info.hold_penalty, previous_cash * rate);
        assert_eq!(cash, previous_cash - previous_cash * rate);
        assert!(r.info.score < previous_score || r.info.score == 0.0);
        previous_cash = cash;
        previous_score = r.info.score;
        if r.terminated {
            break;
        }
    }
}

#[test]
fn losing_steps_drive_score_to_exactly_zero() {
    let mut env = env_with(&EngineConfig::default());
    env.reset(ticks(&[100.0; 300])).unwrap();
    let mut last = None;
    for _ in 0..300 {
        let r = env.step(Action::Hold).unwrap();
        assert!((0.0..=1000.0).contains(&r.info.score));
        last = Some(r.info.score);
    }
    assert_eq!(last, Some(0.0));
}

#[test]
fn no_penalty_on_deployed_capital() {
    let mut config = EngineConfig::default();
    config.simulation.risk_per_trade = 1.0;
    let mut env = env_with(&config);
    env.reset(ticks(&[100.0, 100.0, 100.0])).unwrap();
    env.step(Action::Buy).unwrap();
    let r = env.step(Action::Hold).unwrap();
    assert_eq!(r.info.hold_penalty, 0.0);
    assert_eq!(r.reward, 0.0);
}

// ──────────────────────────────────────────────
// 2. Accounting identity
// ──────────────────────────────────────────────

#[test]
fn net_worth_identity_every_step() {
    let closes = [100.0, 102.0, 99.0, 105.0, 111.0, 108.0, 115.0, 90.0];
    let actions = [
        Action::Buy,
        Action::Buy,
        Action::Hold,
        Action::Sell,
        Action::Hold,
        Action::Buy,
        Action::Hold,
        Action::Sell,
    ];
    let mut env = env_with(&EngineConfig::default());
    env.reset(ticks(&closes)).unwrap();
    for action in actions {
        let r = env.step(action).unwrap();
        let obs = &r.observation;
        assert_eq!(
            r.info.net_worth,
            obs.cash + obs.position.quantity * closes[r.info.step]
        );
    }
    let history = env.into_history().unwrap();
    assert_eq!(history.trades.len(), 2);
    assert_eq!(history.fills.len(), 5);
}

// ──────────────────────────────────────────────
// 3. Round trips
// ──────────────────────────────────────────────

#[test]
fn buy_then_sell_at_unchanged_price_loses() {
    let mut env = env_with(&EngineConfig::default());
    env.reset(ticks(&[100.0, 100.0])).unwrap();
    env.step(Action::Buy).unwrap();
    let r = env.step(Action::Sell).unwrap();
    assert!(r.info.net_worth < 100.0);
    assert!(r.reward < 0.0);
    let history = env.into_history().unwrap();
    assert!(history.trades[0].net_pnl < 0.0);
}

#[test]
fn sell_when_flat_changes_nothing() {
    let mut config = EngineConfig::default();
    config.score.hold_penalty_rate = 0.0;
    let mut env = env_with(&config);
    env.reset(ticks(&[100.0, 101.0])).unwrap();
    let r = env.step(Action::Sell).unwrap();
    assert!(r.info.fill.is_none());
    assert_eq!(r.info.net_worth, 100.0);
    assert_eq!(r.info.score, 1000.0);
}

#[test]
fn flat_sell_is_not_charged_hold_penalty() {
    let config = EngineConfig::default();
    assert!(config.score.hold_penalty_rate > 0.0);
    let mut env = env_with(&config);
    env.reset(ticks(&[100.0, 112.0, 112.0])).unwrap();

    let r = env.step(Action::Sell).unwrap();
    assert!(r.info.fill.is_none());
    assert_eq!(r.info.hold_penalty, 0.0);
    assert_eq!(r.observation.cash, 100.0);
    assert_eq!(r.observation.position.quantity, 0.0);

    // The same flat step as HOLD is charged.
    let r = env.step(Action::Hold).unwrap();
    assert_eq!(r.info.hold_penalty, 100.0 * config.score.hold_penalty_rate);
}

#[test]
fn zero_frictions_refused_at_construction() {
    let mut config = EngineConfig::default();
    config.simulation.fee_rate = 0.0;
    config.simulation.slippage_rate = 0.0;
    assert!(SimulationEnv::new(&config).is_err());

    config.simulation.fee_rate = 0.001;
    assert!(SimulationEnv::new(&config).is_err());

    config.simulation.slippage_rate = 0.0005;
    let mut env = env_with(&config);
    env.reset(ticks(&[100.0, 100.0])).unwrap();
    env.step(Action::Buy).unwrap();
    let r = env.step(Action::Sell).unwrap();
    assert!(r.info.net_worth < config.simulation.initial_capital);
}

// ──────────────────────────────────────────────
// 4. Buy & Hold end to end
// ──────────────────────────────────────────────

#[test]
fn buy_and_hold_on_rising_series() {
    let mut config = EngineConfig::default();
    config.simulation.initial_capital = 100.0;
    config.simulation.fee_rate = 0.001;
    config.simulation.slippage_rate = 0.0005;
    config.simulation.risk_per_trade = 1.0;

    let closes: Vec<f64> = (0..10).map(|i| 100.0 + 50.0 * i as f64 / 9.0).collect();
    let mut env = env_with(&config);
    let mut protocol = BuyAndHold::new();
    let mut obs = env.reset(ticks(&closes)).unwrap();
    loop {
        let decision = protocol.decide(&obs);
        let r = env.step_with_rationale(decision.action, decision.rationale).unwrap();
        obs = r.observation;
        if r.terminated {
            break;
        }
    }

    let history = env.into_history().unwrap();
    assert_eq!(history.fills.len(), 1);
    assert_eq!(history.fills[0].side, Side::Buy);
    assert!(history.final_net_worth() > 100.0);
    assert_eq!(history.steps[0].cash, 0.0);
    assert_eq!(history.termination, Some(TerminationReason::DataExhausted));
}

// ──────────────────────────────────────────────
// 5. History
// ──────────────────────────────────────────────

#[test]
fn rationale_is_recorded() {
    let mut env = env_with(&EngineConfig::default());
    env.reset(ticks(&[100.0, 101.0])).unwrap();
    env.step_with_rationale(Action::Hold, "waiting").unwrap();
    env.step(Action::Hold).unwrap();
    let history = env.into_history().unwrap();
    assert_eq!(history.steps[0].rationale.as_deref(), Some("waiting"));
    assert_eq!(history.steps[1].rationale, None);
}

#[test]
fn history_refused_before_termination() {
    let mut env = env_with(&EngineConfig::default());
    env.reset(ticks(&[100.0, 101.0, 102.0])).unwrap();
    env.step(Action::Hold).unwrap();
    assert_eq!(env.state(), EpisodeState::Running);
    assert!(matches!(
        env.into_history(),
        Err(EngineError::InvalidState {
            state: EpisodeState::Running,
            ..
        })
    ));
}

#[test]
fn replay_is_deterministic() {
    let closes = [100.0, 104.0, 97.0, 103.0, 110.0];
    let run = || {
        let mut env = env_with(&EngineConfig::default());
        env.reset(ticks(&closes)).unwrap();
        for action in [Action::Buy, Action::Hold, Action::Buy, Action::Sell, Action::Hold] {
            env.step(action).unwrap();
        }
        env.into_history().unwrap()
    };
    assert_eq!(run(), run());
}
