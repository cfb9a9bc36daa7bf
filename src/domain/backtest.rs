//! Backtest pipeline.
//!
//! Per instrument: returns → positions → strategy returns → statistics. The
//! chains are independent and run in parallel; the combined series is built
//! once every chain has finished.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::combiner::{self, COMBINED_LABEL};
use super::error::AlgotesterError;
use super::metrics::{PerformanceStats, StatsContext, cumulative_curve};
use super::ohlcv::Instrument;
use super::returns::{growth_curve, log_returns};
use super::series::{CombinedReturnSeries, PositionSeries, ReturnSeries, Series, StrategyReturnSeries};
use super::strategy::{StrategyKind, generate_positions};
use super::timeframe::{DateRange, Interval};
use super::universe::{SkipReason, SkippedSymbol};

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub symbols: Vec<String>,
    pub range: DateRange,
    pub interval: Interval,
    pub risk_free_rate: f64,
    pub strategy: StrategyKind,
}

impl BacktestConfig {
    pub fn stats_context(&self) -> StatsContext {
        StatsContext {
            risk_free_rate: self.risk_free_rate,
            span_years: self.range.span_years(),
            periods_per_year: self.interval.periods_per_year(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentResult {
    pub symbol: String,
    /// Raw log returns over the positioned window.
    pub returns: ReturnSeries,
    pub positions: PositionSeries,
    pub strategy_returns: StrategyReturnSeries,
    pub buy_and_hold: PerformanceStats,
    pub strategy: PerformanceStats,
    /// Strategy cumulative return curve.
    pub cumulative: Series,
    /// exp(cumsum(returns)): the instrument's own price path.
    pub growth: Series,
}

#[derive(Debug, Clone)]
pub struct CombinedResult {
    pub strategy_returns: CombinedReturnSeries,
    pub raw_returns: Series,
    pub strategy: PerformanceStats,
    pub buy_and_hold: PerformanceStats,
    pub cumulative: Series,
}

#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub strategy: StrategyKind,
    pub range: DateRange,
    pub interval: Interval,
    pub instruments: Vec<InstrumentResult>,
    pub combined: CombinedResult,
    pub skipped: Vec<SkippedSymbol>,
}

impl BacktestReport {
    /// Strategy statistics keyed by symbol, with the combined row last.
    pub fn strategy_stats(&self) -> Vec<(&str, &PerformanceStats)> {
        self.instruments
            .iter()
            .map(|r| (r.symbol.as_str(), &r.strategy))
            .chain(std::iter::once((COMBINED_LABEL, &self.combined.strategy)))
            .collect()
    }
}

/// Run one instrument's chain.
///
/// `salt` is the instrument's position in the run; it seeds the random
/// strategy so seeded runs do not depend on thread scheduling.
pub fn run_instrument(
    instrument: &Instrument,
    strategy: &StrategyKind,
    ctx: &StatsContext,
    salt: u64,
) -> Result<InstrumentResult, AlgotesterError> {
    let symbol = instrument.symbol.as_str();
    let all_returns = log_returns(instrument)?;
    let positions = generate_positions(strategy, instrument, &all_returns, salt)?;

    let returns = match positions.first_timestamp() {
        Some(start) => all_returns.trimmed_from(start),
        None => all_returns,
    };
    let strategy_returns = combiner::strategy_returns(symbol, &returns, &positions)?;

    let buy_and_hold = PerformanceStats::compute(symbol, &returns, ctx)?;
    let strategy_stats = PerformanceStats::compute(symbol, &strategy_returns, ctx)?;
    debug!(
        "{}: {} positioned periods, strategy return {:.4}",
        symbol,
        positions.len(),
        strategy_stats.total_return
    );

    Ok(InstrumentResult {
        symbol: symbol.to_string(),
        cumulative: cumulative_curve(&strategy_returns),
        growth: growth_curve(&returns),
        returns,
        positions,
        strategy_returns,
        buy_and_hold,
        strategy: strategy_stats,
    })
}

/// Run the whole backtest over already fetched instruments.
///
/// An instrument whose chain fails is logged and left out of the combined
/// series. The run fails only when no instrument survives.
pub fn run_backtest(
    instruments: &[Instrument],
    config: &BacktestConfig,
) -> Result<BacktestReport, AlgotesterError> {
    let ctx = config.stats_context();
    info!(
        "Running {} over {} instruments, {} to {} ({})",
        config.strategy,
        instruments.len(),
        config.range.start,
        config.range.end,
        config.interval
    );

    let outcomes: Vec<Result<InstrumentResult, AlgotesterError>> = instruments
        .par_iter()
        .enumerate()
        .map(|(i, inst)| run_instrument(inst, &config.strategy, &ctx, i as u64))
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    let mut first_error = None;

    for (inst, outcome) in instruments.iter().zip(outcomes) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!("skipping {} ({})", inst.symbol, e);
                let reason = match &e {
                    AlgotesterError::InsufficientData { bars, minimum, .. } => {
                        SkipReason::InsufficientData {
                            bars: *bars,
                            minimum: *minimum,
                        }
                    }
                    other => SkipReason::Failed(other.to_string()),
                };
                skipped.push(SkippedSymbol {
                    symbol: inst.symbol.clone(),
                    reason,
                });
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if results.is_empty() {
        return Err(first_error.unwrap_or(AlgotesterError::EmptyUniverse));
    }

    // Join point: every chain has finished.
    let combined = combine_results(&results, &ctx)?;
    info!(
        "Combined {} instruments over {} shared periods",
        results.len(),
        combined.strategy_returns.len()
    );

    Ok(BacktestReport {
        strategy: config.strategy.clone(),
        range: config.range,
        interval: config.interval,
        instruments: results,
        combined,
        skipped,
    })
}

fn combine_results(
    results: &[InstrumentResult],
    ctx: &StatsContext,
) -> Result<CombinedResult, AlgotesterError> {
    let strategy_returns = combiner::combine(
        results
            .iter()
            .map(|r| (r.symbol.as_str(), Some(&r.strategy_returns))),
    )?;
    let raw_returns =
        combiner::combine(results.iter().map(|r| (r.symbol.as_str(), Some(&r.returns))))?;

    if strategy_returns.is_empty() {
        return Err(AlgotesterError::InsufficientData {
            symbol: COMBINED_LABEL.to_string(),
            bars: 0,
            minimum: 1,
        });
    }

    Ok(CombinedResult {
        strategy: PerformanceStats::compute(COMBINED_LABEL, &strategy_returns, ctx)?,
        buy_and_hold: PerformanceStats::compute(COMBINED_LABEL, &raw_returns, ctx)?,
        cumulative: cumulative_curve(&strategy_returns),
        strategy_returns,
        raw_returns,
    })
}
