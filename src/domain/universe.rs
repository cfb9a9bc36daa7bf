//! Instrument universe: symbol-list parsing and price retrieval.
//!
//! A symbol whose fetch fails or returns no bars is logged and skipped; the
//! run continues with the rest.

use std::collections::HashSet;
use std::fmt;

use tracing::{info, warn};

use crate::domain::error::AlgotesterError;
use crate::domain::ohlcv::Instrument;
use crate::domain::timeframe::{DateRange, Interval};
use crate::ports::data_port::PriceSeriesStore;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

impl From<UniverseError> for AlgotesterError {
    fn from(err: UniverseError) -> Self {
        AlgotesterError::invalid("backtest", "symbols", err.to_string())
    }
}

/// Split a comma-separated list into upper-cased, de-duplicated symbols.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientData { bars: usize, minimum: usize },
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InsufficientData { bars, minimum } => {
                write!(f, "only {} bars, minimum {} required", bars, minimum)
            }
            SkipReason::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    pub instruments: Vec<Instrument>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Fetch every symbol sequentially, keeping those with data.
pub fn load_universe(
    store: &dyn PriceSeriesStore,
    symbols: &[String],
    range: &DateRange,
    interval: Interval,
) -> Result<LoadedUniverse, AlgotesterError> {
    let mut instruments = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let reason = match store.fetch_bars(symbol, range, interval) {
            Ok(bars) if !bars.is_empty() => {
                info!("  {}: {} bars [OK]", symbol, bars.len());
                instruments.push(Instrument::new(symbol.clone(), bars));
                continue;
            }
            Ok(_) | Err(AlgotesterError::NoData { .. }) => SkipReason::NoData,
            Err(e) => SkipReason::Failed(e.to_string()),
        };

        warn!("skipping {} ({})", symbol, reason);
        skipped.push(SkippedSymbol {
            symbol: symbol.clone(),
            reason,
        });
    }

    if instruments.is_empty() {
        return Err(AlgotesterError::NoData {
            symbol: symbols.join(","),
        });
    }

    if !skipped.is_empty() {
        info!(
            "Backtesting {} of {} symbols",
            instruments.len(),
            symbols.len()
        );
    }

    Ok(LoadedUniverse {
        instruments,
        skipped,
    })
}
