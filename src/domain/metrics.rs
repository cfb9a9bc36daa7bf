//! Performance statistics over a return series.
//!
//! The same computation serves an instrument's raw returns, its strategy
//! returns and the combined series. Volatility is the population standard
//! deviation of the per-period log returns, scaled either to one year or to
//! the backtest span.

use tracing::warn;

use super::error::AlgotesterError;
use super::series::{ReturnSeries, Series, SeriesPoint};

/// Volatility at or below this is treated as zero.
pub const DEGENERATE_VOLATILITY: f64 = 1e-12;

/// Inputs shared by every statistics computation of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsContext {
    /// Annual risk-free rate as a decimal.
    pub risk_free_rate: f64,
    pub span_years: f64,
    pub periods_per_year: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStats {
    pub periods: usize,
    /// exp(sum(returns)) - 1
    pub total_return: f64,
    /// total_return / span_years
    pub mean_annual_return: f64,
    /// stdev * sqrt(periods_per_year)
    pub annualized_volatility: f64,
    /// stdev * sqrt(periods_per_year * span_years)
    pub timeframe_volatility: f64,
    /// None when volatility is degenerate.
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    pub average_drawdown: f64,
}

impl PerformanceStats {
    pub fn compute(
        label: &str,
        returns: &ReturnSeries,
        ctx: &StatsContext,
    ) -> Result<Self, AlgotesterError> {
        if returns.is_empty() {
            return Err(AlgotesterError::InsufficientData {
                symbol: label.to_string(),
                bars: 0,
                minimum: 1,
            });
        }

        let values = returns.values();
        let total = total_return(&values);
        let stddev = population_stddev(&values);
        let annualized_volatility = stddev * ctx.periods_per_year.sqrt();
        let timeframe_volatility = stddev * (ctx.periods_per_year * ctx.span_years).sqrt();

        let sharpe = match sharpe_ratio(label, total, timeframe_volatility, ctx) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("{e}");
                None
            }
        };

        let drawdowns = drawdown_curve(&cumulative_curve(returns)).values();
        let max_drawdown = drawdowns.iter().copied().fold(0.0_f64, f64::min);
        let average_drawdown = drawdowns.iter().sum::<f64>() / drawdowns.len() as f64;

        let mean_annual_return = if ctx.span_years > 0.0 {
            total / ctx.span_years
        } else {
            total
        };

        Ok(PerformanceStats {
            periods: values.len(),
            total_return: total,
            mean_annual_return,
            annualized_volatility,
            timeframe_volatility,
            sharpe_ratio: sharpe,
            max_drawdown,
            average_drawdown,
        })
    }

    /// The Sharpe ratio formatted for reports; degenerate values read `NaN`.
    pub fn sharpe_display(&self) -> String {
        match self.sharpe_ratio {
            Some(s) => format!("{:.2}", s),
            None => "NaN".to_string(),
        }
    }
}

/// Compounded return of a log-return sequence.
pub fn total_return(log_returns: &[f64]) -> f64 {
    log_returns.iter().sum::<f64>().exp() - 1.0
}

pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// (total_return - risk_free_rate * span_years) / volatility
pub fn sharpe_ratio(
    label: &str,
    total_return: f64,
    volatility: f64,
    ctx: &StatsContext,
) -> Result<f64, AlgotesterError> {
    if !volatility.is_finite() || volatility <= DEGENERATE_VOLATILITY {
        return Err(AlgotesterError::DegenerateVolatility {
            series: label.to_string(),
        });
    }
    Ok((total_return - ctx.risk_free_rate * ctx.span_years) / volatility)
}

/// cumulative[i] = product(1 + returns[0..=i]), floored at 0.
///
/// A period with `r <= -1` wipes the curve out and it stays at 0.
pub fn cumulative_curve(returns: &ReturnSeries) -> Series {
    let mut acc = 1.0_f64;
    scan(returns, |r| {
        acc = (acc * (1.0 + r)).max(0.0);
        acc
    })
}

pub fn running_max(curve: &Series) -> Series {
    let mut peak = f64::NEG_INFINITY;
    scan(curve, |v| {
        peak = peak.max(v);
        peak
    })
}

/// (cumulative[i] - running_max[i]) / running_max[i]; within [-1, 0] for a
/// non-negative curve.
pub fn drawdown_curve(cumulative: &Series) -> Series {
    let peaks = running_max(cumulative);
    Series::new(
        cumulative
            .points
            .iter()
            .zip(&peaks.points)
            .map(|(p, peak)| SeriesPoint {
                timestamp: p.timestamp,
                value: if peak.value > 0.0 {
                    (p.value - peak.value) / peak.value
                } else {
                    0.0
                },
            })
            .collect(),
    )
}

fn scan(series: &Series, mut f: impl FnMut(f64) -> f64) -> Series {
    Series::new(
        series
            .points
            .iter()
            .map(|p| SeriesPoint {
                timestamp: p.timestamp,
                value: f(p.value),
            })
            .collect(),
    )
}
