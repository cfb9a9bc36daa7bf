//! RSI threshold: long when oversold, short when overbought, otherwise hold.

use super::{LONG, SHORT, Signal, check_window};
use crate::domain::error::AlgotesterError;
use crate::domain::indicator::calculate_rsi;

pub const DEFAULT_WINDOW: usize = 14;
pub const DEFAULT_LOWER: f64 = 30.0;
pub const DEFAULT_UPPER: f64 = 70.0;

pub fn validate(window: usize, lower: f64, upper: f64) -> Result<(), AlgotesterError> {
    if window == 0 {
        return Err(AlgotesterError::invalid(
            "strategy",
            "rsi_window",
            "window must be positive",
        ));
    }
    check_window("rsi_window", window)?;
    if !(0.0..=100.0).contains(&lower) || !(0.0..=100.0).contains(&upper) {
        return Err(AlgotesterError::invalid(
            "strategy",
            "rsi_lower",
            "thresholds must lie within 0..=100",
        ));
    }
    if lower >= upper {
        return Err(AlgotesterError::invalid(
            "strategy",
            "rsi_upper",
            format!("upper threshold ({upper}) must exceed lower threshold ({lower})"),
        ));
    }
    Ok(())
}

pub fn signals(closes: &[f64], window: usize, lower: f64, upper: f64) -> Vec<Signal> {
    calculate_rsi(closes, window)
        .into_iter()
        .map(|rsi| match rsi {
            None => Signal::Undefined,
            Some(v) if v < lower => Signal::Position(LONG),
            Some(v) if v > upper => Signal::Position(SHORT),
            Some(_) => Signal::Hold,
        })
        .collect()
}
