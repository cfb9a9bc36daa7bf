//! Strategy engine: maps price and return history to a position per period.
//!
//! Strategies form a closed set ([`StrategyKind`]); [`generate_positions`] is
//! the single dispatch point. Each variant emits one [`Signal`] per bar using
//! only closes up to and including that bar. Signals are forward-filled and
//! then shifted one period: the return realised at bar `t` is held with the
//! signal of bar `t - 1`. Periods whose source signal is still warming up are
//! dropped, so the resulting positions align with a suffix of the returns.

pub mod lag;
pub mod macd;
pub mod random;
pub mod rsi;
pub mod sma;

use std::fmt;

use crate::domain::error::AlgotesterError;
use crate::domain::ohlcv::Instrument;
use crate::domain::series::{PositionSeries, ReturnSeries, Series, SeriesPoint};

pub const LONG: f64 = 1.0;
pub const SHORT: f64 = -1.0;
pub const FLAT: f64 = 0.0;

pub const STRATEGY_NAMES: [&str; 5] = ["sma", "random", "lag", "rsi", "macd"];

/// Largest window, period or lag count any strategy accepts.
pub const MAX_WINDOW: usize = 10_000;

pub(crate) fn check_window(key: &str, window: usize) -> Result<(), AlgotesterError> {
    if window > MAX_WINDOW {
        return Err(AlgotesterError::invalid(
            "strategy",
            key,
            format!("{window} exceeds the maximum of {MAX_WINDOW}"),
        ));
    }
    Ok(())
}

/// Per-bar strategy output before forward-filling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// Not enough history yet, or no value for this bar.
    Undefined,
    /// Keep whatever position is currently held.
    Hold,
    Position(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyKind {
    MovingAverageCrossover {
        short_window: usize,
        long_window: usize,
    },
    Random {
        seed: Option<u64>,
    },
    LaggedWeightedSum {
        weights: Vec<f64>,
    },
    RsiThreshold {
        window: usize,
        lower: f64,
        upper: f64,
    },
    MacdCrossover {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl StrategyKind {
    /// The named strategy with its default parameters.
    pub fn default_for(name: &str) -> Result<Self, AlgotesterError> {
        match name.trim().to_lowercase().as_str() {
            "sma" => Ok(StrategyKind::MovingAverageCrossover {
                short_window: sma::DEFAULT_SHORT,
                long_window: sma::DEFAULT_LONG,
            }),
            "random" => Ok(StrategyKind::Random { seed: None }),
            "lag" => Ok(StrategyKind::LaggedWeightedSum {
                weights: lag::DEFAULT_WEIGHTS.to_vec(),
            }),
            "rsi" => Ok(StrategyKind::RsiThreshold {
                window: rsi::DEFAULT_WINDOW,
                lower: rsi::DEFAULT_LOWER,
                upper: rsi::DEFAULT_UPPER,
            }),
            "macd" => Ok(StrategyKind::MacdCrossover {
                fast: macd::DEFAULT_FAST,
                slow: macd::DEFAULT_SLOW,
                signal: macd::DEFAULT_SIGNAL,
            }),
            _ => Err(AlgotesterError::UnknownStrategy {
                name: name.trim().to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::MovingAverageCrossover { .. } => "sma",
            StrategyKind::Random { .. } => "random",
            StrategyKind::LaggedWeightedSum { .. } => "lag",
            StrategyKind::RsiThreshold { .. } => "rsi",
            StrategyKind::MacdCrossover { .. } => "macd",
        }
    }

    pub fn validate(&self) -> Result<(), AlgotesterError> {
        match self {
            StrategyKind::MovingAverageCrossover {
                short_window,
                long_window,
            } => sma::validate(*short_window, *long_window),
            StrategyKind::Random { .. } => Ok(()),
            StrategyKind::LaggedWeightedSum { weights } => lag::validate(weights),
            StrategyKind::RsiThreshold {
                window,
                lower,
                upper,
            } => rsi::validate(*window, *lower, *upper),
            StrategyKind::MacdCrossover { fast, slow, signal } => {
                macd::validate(*fast, *slow, *signal)
            }
        }
    }

    /// Bar index of the first defined signal.
    pub fn lookback(&self) -> usize {
        match self {
            StrategyKind::MovingAverageCrossover { long_window, .. } => long_window.saturating_sub(1),
            StrategyKind::Random { .. } => 0,
            StrategyKind::LaggedWeightedSum { weights } => weights.len(),
            StrategyKind::RsiThreshold { window, .. } => *window,
            StrategyKind::MacdCrossover { slow, signal, .. } => slow.saturating_add(*signal).saturating_sub(2),
        }
    }

    /// Bars needed for at least one positioned return.
    pub fn min_bars(&self) -> usize {
        self.lookback().saturating_add(2)
    }

    /// Position held before the first explicit signal.
    pub fn initial_position(&self) -> f64 {
        FLAT
    }

    /// One signal per bar of `instrument`.
    ///
    /// `salt` distinguishes instruments for the seeded random strategy.
    pub fn signals(&self, instrument: &Instrument, returns: &ReturnSeries, salt: u64) -> Vec<Signal> {
        match self {
            StrategyKind::MovingAverageCrossover {
                short_window,
                long_window,
            } => sma::signals(&instrument.closes(), *short_window, *long_window),
            StrategyKind::Random { seed } => random::signals(instrument.bar_count(), *seed, salt),
            StrategyKind::LaggedWeightedSum { weights } => lag::signals(&returns.values(), weights),
            StrategyKind::RsiThreshold {
                window,
                lower,
                upper,
            } => rsi::signals(&instrument.closes(), *window, *lower, *upper),
            StrategyKind::MacdCrossover { fast, slow, signal } => {
                macd::signals(&instrument.closes(), *fast, *slow, *signal)
            }
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::MovingAverageCrossover {
                short_window,
                long_window,
            } => write!(f, "sma({}, {})", short_window, long_window),
            StrategyKind::Random { seed: Some(seed) } => write!(f, "random(seed={})", seed),
            StrategyKind::Random { seed: None } => write!(f, "random"),
            StrategyKind::LaggedWeightedSum { weights } => {
                let ws: Vec<String> = weights.iter().map(|w| w.to_string()).collect();
                write!(f, "lag[{}]", ws.join(", "))
            }
            StrategyKind::RsiThreshold {
                window,
                lower,
                upper,
            } => write!(f, "rsi({}, {}, {})", window, lower, upper),
            StrategyKind::MacdCrossover { fast, slow, signal } => {
                write!(f, "macd({}, {}, {})", fast, slow, signal)
            }
        }
    }
}

/// Carry the last defined position through `Hold` and `Undefined` signals.
///
/// Leading `Undefined` signals stay `None`. A `Hold` before any position was
/// set starts from `initial`.
pub fn forward_fill(signals: &[Signal], initial: f64) -> Vec<Option<f64>> {
    let mut last: Option<f64> = None;
    signals
        .iter()
        .map(|signal| {
            match signal {
                Signal::Position(p) => last = Some(*p),
                Signal::Hold => last = last.or(Some(initial)),
                Signal::Undefined => {}
            }
            last
        })
        .collect()
}

/// Run `strategy` over one instrument and return its position series.
///
/// The positions are aligned with `returns` trimmed to the first positioned
/// period.
pub fn generate_positions(
    strategy: &StrategyKind,
    instrument: &Instrument,
    returns: &ReturnSeries,
    salt: u64,
) -> Result<PositionSeries, AlgotesterError> {
    let bars = instrument.bar_count();
    let minimum = strategy.min_bars();
    if bars < minimum {
        return Err(AlgotesterError::InsufficientData {
            symbol: instrument.symbol.clone(),
            bars,
            minimum,
        });
    }
    if returns.len() + 1 != bars {
        return Err(AlgotesterError::Alignment {
            symbol: instrument.symbol.clone(),
            returns: returns.len(),
            positions: bars.saturating_sub(1),
        });
    }

    let signals = strategy.signals(instrument, returns, salt);
    let held = forward_fill(&signals, strategy.initial_position());

    // returns.points[j] is realised at bar j + 1 and held with the signal of bar j.
    let points: Vec<SeriesPoint> = returns
        .points
        .iter()
        .zip(&held)
        .filter_map(|(point, position)| {
            position.map(|value| SeriesPoint {
                timestamp: point.timestamp,
                value,
            })
        })
        .collect();

    if points.is_empty() {
        return Err(AlgotesterError::InsufficientData {
            symbol: instrument.symbol.clone(),
            bars,
            minimum,
        });
    }

    Ok(Series::new(points))
}
