//! Criterion benchmarks for Sentinel hot paths.
//!
//! Benchmarks:
//! 1. Episode step loop (HOLD-only, no protocol overhead)
//! 2. Full episode with the statistical protocol deciding every tick
//! 3. Cost model fills
//! 4. Indicator computation over an observation window

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sentinel_core::config::EngineConfig;
use sentinel_core::domain::{Action, MarketTick, Sentiment};
use sentinel_core::engine::{CostModel, SimulationEnv};
use sentinel_core::indicators::{Indicator, Rsi, Sma};
use sentinel_core::strategy::{create_protocol, StrategyKind};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_ticks(n: usize) -> Vec<MarketTick> {
    let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            MarketTick {
                timestamp: base + Duration::hours(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000.0 + (i % 50) as f64 * 20.0,
                sentiment: Some(Sentiment::new((i as f64 * 0.05).cos(), "bench")),
            }
        })
        .collect()
}

// ── 1. Step loop ─────────────────────────────────────────────────────

fn bench_step_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_loop");
    let config = EngineConfig::default();

    for &n in &[365, 2_190, 8_760] {
        let ticks = make_ticks(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &ticks, |b, ticks| {
            b.iter(|| {
                let mut env = SimulationEnv::new(&config).unwrap();
                env.reset(ticks.clone()).unwrap();
                for i in 0..ticks.len() {
                    let action = if i % 10 == 0 { Action::Buy } else { Action::Hold };
                    black_box(env.step(action).unwrap());
                }
            })
        });
    }
    group.finish();
}

// ── 2. Statistical episode ───────────────────────────────────────────

fn bench_statistical_episode(c: &mut Criterion) {
    let config = EngineConfig::default();
    let ticks = make_ticks(2_190);

    c.bench_function("statistical_episode_2190", |b| {
        b.iter(|| {
            let mut env = SimulationEnv::new(&config).unwrap();
            let mut protocol = create_protocol(StrategyKind::Statistical, &config, "BENCH").unwrap();
            let mut obs = env.reset(ticks.clone()).unwrap();
            loop {
                let d = protocol.decide(&obs);
                let r = env.step(d.action).unwrap();
                obs = r.observation;
                if r.terminated {
                    break;
                }
            }
            black_box(env.into_history().unwrap())
        })
    });
}

// ── 3. Cost model ────────────────────────────────────────────────────

fn bench_cost_model(c: &mut Criterion) {
    let cost = CostModel::new(0.001, 0.0005).unwrap();
    c.bench_function("cost_model_round_trip", |b| {
        b.iter(|| {
            let buy = cost.buy_with_budget(black_box(100.0), black_box(50.0));
            black_box(cost.sell_quantity(black_box(101.0), buy.quantity))
        })
    });
}

// ── 4. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let closes: Vec<f64> = make_ticks(40).iter().map(|t| t.close).collect();
    let sma = Sma::new(30);
    let rsi = Rsi::new(14);

    c.bench_function("window_sma_30", |b| b.iter(|| black_box(sma.compute(&closes))));
    c.bench_function("window_rsi_14", |b| b.iter(|| black_box(rsi.compute(&closes))));
}

criterion_group!(
    benches,
    bench_step_loop,
    bench_statistical_episode,
    bench_cost_model,
    bench_indicators,
);
criterion_main!(benches);
