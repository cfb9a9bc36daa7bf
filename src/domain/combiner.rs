//! Strategy return combiner.
//!
//! Per instrument: strategy return = position × return, elementwise over
//! aligned series. Across instruments: the combined series is the unweighted
//! sum of every instrument's strategy returns at the timestamps they share.

use crate::domain::error::AlgotesterError;
use crate::domain::series::{
    CombinedReturnSeries, PositionSeries, ReturnSeries, Series, SeriesPoint,
    StrategyReturnSeries, common_timeline,
};

pub const COMBINED_LABEL: &str = "Combined";

pub fn strategy_returns(
    symbol: &str,
    returns: &ReturnSeries,
    positions: &PositionSeries,
) -> Result<StrategyReturnSeries, AlgotesterError> {
    if !returns.is_aligned_with(positions) {
        return Err(AlgotesterError::Alignment {
            symbol: symbol.to_string(),
            returns: returns.len(),
            positions: positions.len(),
        });
    }

    let points = returns
        .points
        .iter()
        .zip(&positions.points)
        .map(|(r, p)| SeriesPoint {
            timestamp: r.timestamp,
            value: p.value * r.value,
        })
        .collect();

    Ok(Series::new(points))
}

/// Sum strategy returns across instruments over their common timestamps.
///
/// Every leg must carry a computed series; a `None` leg fails with
/// `NoStrategyColumn` naming that symbol.
pub fn combine<'a, I>(legs: I) -> Result<CombinedReturnSeries, AlgotesterError>
where
    I: IntoIterator<Item = (&'a str, Option<&'a StrategyReturnSeries>)>,
{
    let mut series: Vec<&StrategyReturnSeries> = Vec::new();
    for (symbol, leg) in legs {
        match leg {
            Some(s) => series.push(s),
            None => {
                return Err(AlgotesterError::NoStrategyColumn {
                    symbol: symbol.to_string(),
                });
            }
        }
    }
    if series.is_empty() {
        return Err(AlgotesterError::EmptyUniverse);
    }

    let timeline = common_timeline(series.iter().copied());
    let indexes: Vec<_> = series.iter().map(|s| s.value_index()).collect();

    let points = timeline
        .into_iter()
        .map(|timestamp| SeriesPoint {
            timestamp,
            value: indexes.iter().filter_map(|idx| idx.get(&timestamp)).sum(),
        })
        .collect();

    Ok(Series::new(points))
}
