//! Return calculator: close prices to log returns.
//!
//! r[i] = ln(close[i] / close[i-1]) for i >= 1. The first bar has no prior
//! close and is dropped rather than filled, so a series built from `n` bars
//! always holds `n - 1` returns. Every close must be finite and positive.

use crate::domain::error::AlgotesterError;
use crate::domain::ohlcv::Instrument;
use crate::domain::series::{ReturnSeries, Series, SeriesPoint};

pub const MIN_BARS_FOR_RETURNS: usize = 2;

pub fn log_returns(instrument: &Instrument) -> Result<ReturnSeries, AlgotesterError> {
    let bars = &instrument.bars;
    if bars.len() < MIN_BARS_FOR_RETURNS {
        return Err(AlgotesterError::InsufficientData {
            symbol: instrument.symbol.clone(),
            bars: bars.len(),
            minimum: MIN_BARS_FOR_RETURNS,
        });
    }

    if let Some(bad) = bars.iter().find(|b| !b.close.is_finite() || b.close <= 0.0) {
        return Err(AlgotesterError::DataSource {
            reason: format!(
                "{} at {}: close {} is not a positive price",
                instrument.symbol, bad.timestamp, bad.close
            ),
        });
    }

    let points = bars
        .windows(2)
        .map(|w| SeriesPoint {
            timestamp: w[1].timestamp,
            value: (w[1].close / w[0].close).ln(),
        })
        .collect();

    Ok(Series::new(points))
}

/// exp(cumsum(returns)): the price path relative to the first close.
pub fn growth_curve(returns: &ReturnSeries) -> Series {
    let mut acc = 0.0;
    Series::new(
        returns
            .points
            .iter()
            .map(|p| {
                acc += p.value;
                SeriesPoint {
                    timestamp: p.timestamp,
                    value: acc.exp(),
                }
            })
            .collect(),
    )
}
