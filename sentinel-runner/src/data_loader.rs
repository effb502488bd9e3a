//! Tick loading for the runner.
//!
//! The engine consumes a pre-aligned series and never fetches data itself.
//! A `TickSource` turns (symbol, date range) into that series:
//! - `CsvTickSource` reads a tick file (one row per tick)
//! - `SyntheticTickSource` generates a seeded random walk for development
//!
//! Sources only filter to the requested range. Ordering and gap checks are
//! the engine's job and happen at `reset`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;

use sentinel_core::domain::Sentiment;
use sentinel_core::MarketTick;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open tick file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognized timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("no ticks for '{symbol}' between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Anything that can produce an aligned tick series for one asset.
pub trait TickSource: Send + Sync {
    fn name(&self) -> &str;

    /// Ticks for `symbol` with timestamps on `start..=end` (UTC dates).
    fn load(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<MarketTick>, LoadError>;
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Reads ticks from a CSV file with a header row.
///
/// Required columns: `timestamp, open, high, low, close, volume`. Optional:
/// `sentiment` (score in [-1, 1]), `sentiment_source`, and `symbol` (when
/// present, rows for other symbols are skipped). Timestamps may be RFC 3339,
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` or unix seconds.
#[derive(Debug, Clone)]
pub struct CsvTickSource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    sentiment: Option<f64>,
    #[serde(default)]
    sentiment_source: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
}

impl CsvTickSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TickSource for CsvTickSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn load(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MarketTick>, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|source| LoadError::Open {
                path: self.path.clone(),
                source,
            })?;

        let mut ticks = Vec::new();
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row?;
            // Header is line 1.
            let line = i + 2;

            if let Some(row_symbol) = &row.symbol {
                if !row_symbol.eq_ignore_ascii_case(symbol) {
                    continue;
                }
            }

            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
                row: line,
                value: row.timestamp.clone(),
            })?;
            let date = timestamp.date_naive();
            if date < start || date > end {
                continue;
            }

            let sentiment = row.sentiment.filter(|s| s.is_finite()).map(|score| {
                Sentiment::new(score, row.sentiment_source.unwrap_or_else(|| "csv".into()))
            });

            ticks.push(MarketTick {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
                sentiment,
            });
        }

        if ticks.is_empty() {
            return Err(LoadError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }

        tracing::info!(
            symbol,
            path = %self.path.display(),
            ticks = ticks.len(),
            "loaded ticks from CSV"
        );
        Ok(ticks)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Seeded random walk with occasional pump events, one tick per day.
///
/// The seed is derived from the symbol, so the same symbol and range always
/// yield the same series. Results on synthetic ticks are for development
/// only.
#[derive(Debug, Clone)]
pub struct SyntheticTickSource {
    start_price: f64,
    /// Probability that a given day carries a pump (price and volume spike).
    pump_probability: f64,
}

impl Default for SyntheticTickSource {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            pump_probability: 0.03,
        }
    }
}

impl SyntheticTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    pub fn with_pump_probability(mut self, probability: f64) -> Self {
        self.pump_probability = probability.clamp(0.0, 1.0);
        self
    }
}

impl TickSource for SyntheticTickSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn load(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MarketTick>, LoadError> {
        let ticks = generate_synthetic_ticks(symbol, start, end, self.start_price, self.pump_probability);
        if ticks.is_empty() {
            return Err(LoadError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        tracing::warn!(symbol, ticks = ticks.len(), "using synthetic ticks");
        Ok(ticks)
    }
}

fn generate_synthetic_ticks(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    start_price: f64,
    pump_probability: f64,
) -> Vec<MarketTick> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut ticks = Vec::new();
    let mut price = start_price;
    let mut sentiment = 0.0_f64;
    let mut current = start;

    while current <= end {
        let pump = rng.gen_bool(pump_probability);
        let daily_return: f64 = if pump {
            rng.gen_range(0.08..0.15)
        } else {
            rng.gen_range(-0.03..0.03)
        };
        let base_volume: f64 = rng.gen_range(500_000.0..5_000_000.0);
        let volume = if pump {
            base_volume * rng.gen_range(6.0..10.0)
        } else {
            base_volume
        };

        sentiment = (sentiment * 0.8 + daily_return * 10.0 + rng.gen_range(-0.1..0.1))
            .clamp(-1.0, 1.0);

        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));

        if let Some(midnight) = current.and_hms_opt(0, 0, 0) {
            ticks.push(MarketTick {
                timestamp: Utc.from_utc_datetime(&midnight),
                open,
                high,
                low,
                close,
                volume,
                sentiment: Some(Sentiment::new(sentiment, "synthetic")),
            });
        }

        price = close;
        current += Duration::days(1);
    }

    ticks
}

/// BLAKE3 hash over every tick, for tagging reports with their dataset.
pub fn dataset_hash(ticks: &[MarketTick]) -> String {
    let mut hasher = blake3::Hasher::new();
    for tick in ticks {
        hasher.update(&tick.timestamp.timestamp().to_le_bytes());
        hasher.update(&tick.open.to_le_bytes());
        hasher.update(&tick.high.to_le_bytes());
        hasher.update(&tick.low.to_le_bytes());
        hasher.update(&tick.close.to_le_bytes());
        hasher.update(&tick.volume.to_le_bytes());
        if let Some(score) = tick.sentiment_score() {
            hasher.update(&score.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
