//! Sentinel CLI — run, compare and sweep commands.
//!
//! Commands:
//! - `run`: one backtest from a TOML config file and/or flags
//! - `compare`: several strategies on the same ticks, ranked by Sharpe
//! - `sweep`: strategies × hold-penalty rates × risk fractions, ranked
//!
//! Ticks come from `--data` (CSV) when given, otherwise from the seeded
//! synthetic generator. Logging goes to stderr, filtered by `RUST_LOG`.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use tracing_subscriber::EnvFilter;

use sentinel_core::{EngineConfig, StrategyKind};
use sentinel_runner::{
    compare, run_backtest, source_for, BacktestConfig, BacktestReport, BacktestSpec, ParamGrid,
    RankedTable, Sweep,
};

#[derive(Parser)]
#[command(
    name = "sentinel",
    about = "Sentinel — backtesting engine for statistical, swing and contrarian strategies"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backtest.
    Run {
        #[command(flatten)]
        base: BaseArgs,

        /// Strategy: statistical, swing, contrarian, buy_hold, agent.
        #[arg(long)]
        strategy: Option<StrategyKind>,

        /// Print the full report (history included) as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write the full report as JSON to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run several strategies on the same ticks and rank them.
    Compare {
        #[command(flatten)]
        base: BaseArgs,

        /// Strategies to compare. Defaults to all built-in strategies.
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<StrategyKind>,

        /// Print the ranked table as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Grid search over strategies, hold-penalty rates and risk fractions.
    Sweep {
        #[command(flatten)]
        base: BaseArgs,

        /// Strategies in the grid. Defaults to all built-in strategies.
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<StrategyKind>,

        /// Hold-penalty rates in the grid.
        #[arg(long, value_delimiter = ',', default_values_t = vec![0.0, 0.05, 0.10])]
        hold_penalty_rates: Vec<f64>,

        /// Risk-per-trade fractions in the grid.
        #[arg(long, value_delimiter = ',', default_values_t = vec![0.05, 0.10, 0.20])]
        risk: Vec<f64>,

        /// Show only the best N entries.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print the ranked table as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Options shared by every command. Flags override the config file.
#[derive(Args)]
struct BaseArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset symbol (required without --config).
    #[arg(long)]
    symbol: Option<String>,

    /// Start date (YYYY-MM-DD). Defaults to one year before --end.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// CSV tick file. Synthetic ticks are used when neither this nor the
    /// config names one.
    #[arg(long)]
    data: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cancel = AtomicBool::new(false);

    match cli.command {
        Commands::Run {
            base,
            strategy,
            json,
            output,
        } => run_cmd(&base, strategy, json, output, &cancel),
        Commands::Compare {
            base,
            strategies,
            json,
        } => compare_cmd(&base, strategies, json, &cancel),
        Commands::Sweep {
            base,
            strategies,
            hold_penalty_rates,
            risk,
            top,
            json,
        } => sweep_cmd(&base, strategies, hold_penalty_rates, risk, top, json, &cancel),
    }
}

fn run_cmd(
    base: &BaseArgs,
    strategy: Option<StrategyKind>,
    json: bool,
    output: Option<PathBuf>,
    cancel: &AtomicBool,
) -> Result<()> {
    let mut config = resolve_config(base)?;
    if let Some(strategy) = strategy {
        config.backtest.strategy = strategy;
    }

    let source = source_for(&config.backtest);
    let report = run_backtest(&config, source.as_ref(), cancel)?;

    if let Some(path) = &output {
        let body = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
        eprintln!("Report written to: {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn compare_cmd(
    base: &BaseArgs,
    strategies: Vec<StrategyKind>,
    json: bool,
    cancel: &AtomicBool,
) -> Result<()> {
    let config = resolve_config(base)?;
    let strategies = or_all(strategies);
    let source = source_for(&config.backtest);
    let table = compare(&config, &strategies, source.as_ref(), cancel)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        print_table(&table, table.len(), false);
    }
    Ok(())
}

fn sweep_cmd(
    base: &BaseArgs,
    strategies: Vec<StrategyKind>,
    hold_penalty_rates: Vec<f64>,
    risk: Vec<f64>,
    top: usize,
    json: bool,
    cancel: &AtomicBool,
) -> Result<()> {
    let config = resolve_config(base)?;
    let grid = ParamGrid::new(or_all(strategies))
        .with_hold_penalty_rates(hold_penalty_rates)
        .with_risk_per_trade(risk);
    if grid.size() == 0 {
        bail!("sweep grid is empty");
    }

    let source = source_for(&config.backtest);
    let table = Sweep::new().run_with_progress(&grid, &config, source.as_ref(), cancel, |_, total, report| {
        tracing::debug!(
            total,
            strategy = %report.strategy(),
            sharpe = report.metrics.sharpe_ratio,
            "sweep point done"
        );
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        print_table(&table, top, true);
    }
    Ok(())
}

/// Config file first (if any), then flag overrides.
fn resolve_config(base: &BaseArgs) -> Result<BacktestConfig> {
    let mut config = match &base.config {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let Some(symbol) = base.symbol.clone() else {
                bail!("--symbol is required without --config");
            };
            let end = base.end.unwrap_or_else(|| chrono::Utc::now().date_naive());
            let start = base.start.unwrap_or(end - chrono::Duration::days(365));
            let spec = BacktestSpec {
                symbol,
                start,
                end,
                strategy: StrategyKind::Statistical,
                data: None,
            };
            BacktestConfig::new(spec, EngineConfig::default())?
        }
    };

    if base.config.is_some() {
        if let Some(symbol) = &base.symbol {
            config.backtest.symbol = symbol.clone();
        }
        if let Some(start) = base.start {
            config.backtest.start = start;
        }
        if let Some(end) = base.end {
            config.backtest.end = end;
        }
    }
    if let Some(data) = &base.data {
        config.backtest.data = Some(data.clone());
    }
    config.validate()?;
    Ok(config)
}

fn or_all(strategies: Vec<StrategyKind>) -> Vec<StrategyKind> {
    if strategies.is_empty() {
        StrategyKind::ALL.to_vec()
    } else {
        strategies
    }
}

fn print_summary(report: &BacktestReport) {
    let spec = &report.config.backtest;
    let m = &report.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", report.run_id.get(..12).unwrap_or(&report.run_id));
    println!("Strategy:       {}", spec.strategy);
    println!("Symbol:         {}", spec.symbol);
    println!("Period:         {} to {}", spec.start, spec.end);
    println!("Ticks:          {} ({})", report.dataset.ticks, report.dataset.source);
    println!("Steps:          {}", m.steps);
    if let Some(reason) = report.history.termination {
        println!("Terminated:     {reason:?}");
    }
    println!();
    println!("--- Performance ---");
    println!("Final Value:    ${:.2}", m.final_net_worth);
    println!("Total Return:   {:+.2}%", m.total_return_pct);
    println!("Sharpe:         {:.3}", m.sharpe_ratio);
    println!("Max Drawdown:   {:.2}% ({} steps)", m.max_drawdown_pct, m.max_drawdown_steps);
    println!("Final Score:    {:.1}", m.final_score);
    println!();
    println!("--- Trades ---");
    println!(
        "Trades:         {} ({} won, {} lost)",
        m.trade_count, m.winning_trades, m.losing_trades
    );
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:  {}", m.profit_factor);
    println!("Avg Win/Loss:   {:.4} / {:.4}", m.avg_win, m.avg_loss);
    println!();
    println!("--- Frictions ---");
    println!("Fees:           {:.4}", m.total_fees);
    println!("Slippage:       {:.4}", m.total_slippage);
    println!("Hold Penalty:   {:.4}", m.total_hold_penalty);
    if report.dataset.is_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}

fn print_table(table: &RankedTable, top: usize, with_params: bool) {
    println!();
    println!(
        "=== {}: {} runs on {} ticks ({}) ===",
        table.symbol,
        table.len(),
        table.dataset.ticks,
        table.dataset.source
    );
    if with_params {
        println!(
            "{:>4}  {:<12} {:>6} {:>6} {:>8} {:>9} {:>8} {:>7} {:>7}",
            "#", "strategy", "hold", "risk", "sharpe", "return%", "maxdd%", "trades", "pf"
        );
    } else {
        println!(
            "{:>4}  {:<12} {:>8} {:>9} {:>8} {:>7} {:>7}",
            "#", "strategy", "sharpe", "return%", "maxdd%", "trades", "pf"
        );
    }
    for entry in table.top_n(top) {
        let m = &entry.metrics;
        let pf = m.profit_factor.to_string();
        if with_params {
            println!(
                "{:>4}  {:<12} {:>6.2} {:>6.2} {:>8.3} {:>9.2} {:>8.2} {:>7} {:>7}",
                entry.rank,
                entry.strategy.as_str(),
                entry.hold_penalty_rate,
                entry.risk_per_trade,
                m.sharpe_ratio,
                m.total_return_pct,
                m.max_drawdown_pct,
                m.trade_count,
                pf
            );
        } else {
            println!(
                "{:>4}  {:<12} {:>8.3} {:>9.2} {:>8.2} {:>7} {:>7}",
                entry.rank,
                entry.strategy.as_str(),
                m.sharpe_ratio,
                m.total_return_pct,
                m.max_drawdown_pct,
                m.trade_count,
                pf
            );
        }
    }
    if table.dataset.is_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}
