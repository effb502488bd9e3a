//! Property tests for the metrics engine.
//!
//! 1. Drawdown depth stays within [-100, 0] and its duration inside the curve
//! 2. A non-decreasing equity curve has no drawdown
//! 3. Sharpe is unchanged when every return is scaled by a positive factor
//! 4. Whole synthetic backtests keep the score and trade counts in range

use std::sync::atomic::AtomicBool;

use proptest::prelude::*;
use sentinel_core::StrategyKind;
use sentinel_runner::metrics::{max_drawdown, sharpe_ratio, step_returns};
use sentinel_runner::{run_backtest, BacktestConfig, SyntheticTickSource};

fn arb_equity(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..10_000.0_f64, 2..len)
}

fn arb_strategy() -> impl Strategy<Value = StrategyKind> {
    prop::sample::select(StrategyKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn drawdown_is_bounded(curve in arb_equity(200)) {
        let (depth, steps) = max_drawdown(&curve);
        prop_assert!(depth <= 0.0);
        prop_assert!(depth >= -100.0);
        prop_assert!(steps < curve.len());
        if depth == 0.0 {
            prop_assert_eq!(steps, 0);
        }
    }

    #[test]
    fn rising_curve_has_no_drawdown(mut curve in arb_equity(200)) {
        curve.sort_by(f64::total_cmp);
        prop_assert_eq!(max_drawdown(&curve), (0.0, 0));
        prop_assert!(step_returns(&curve).iter().all(|r| *r >= 0.0));
    }

    #[test]
    fn sharpe_is_scale_invariant(
        returns in prop::collection::vec(-0.1..0.1_f64, 2..100),
        scale in 0.5..10.0_f64,
    ) {
        let scaled: Vec<f64> = returns.iter().map(|r| r * scale).collect();
        let a = sharpe_ratio(&returns, 365.0);
        let b = sharpe_ratio(&scaled, 365.0);
        prop_assert!((a - b).abs() <= 1e-6 * a.abs().max(1.0), "{a} vs {b}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn synthetic_backtests_stay_consistent(
        strategy in arb_strategy(),
        symbol in "[A-Z]{3,5}",
        hold_penalty in 0.0..0.1_f64,
    ) {
        let mut config = BacktestConfig::from_toml(
            r#"[backtest]
symbol = "BTC"
start = "2024-01-01"
end = "2024-06-30"
"#,
        )
        .unwrap();
        config.backtest.symbol = symbol;
        config.backtest.strategy = strategy;
        config.engine.score.hold_penalty_rate = hold_penalty;

        let report = run_backtest(&config, &SyntheticTickSource::new(), &AtomicBool::new(false)).unwrap();
        let m = &report.metrics;

        prop_assert!((0.0..=1000.0).contains(&m.final_score));
        prop_assert_eq!(m.steps, report.history.steps.len());
        prop_assert!(m.winning_trades + m.losing_trades <= m.trade_count);
        prop_assert!((0.0..=1.0).contains(&m.win_rate));
        prop_assert!(m.max_drawdown_pct <= 0.0);
        prop_assert!(m.final_net_worth >= 0.0);
    }
}
